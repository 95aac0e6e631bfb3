//! Daily close series for the underlying index.

use chrono::NaiveDate;

/// One daily close of the underlying (e.g. Nifty 50).
#[derive(Debug, Clone, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Natural-log returns between consecutive closes.
///
/// Closes must be in ascending date order; non-positive closes are skipped
/// because their log return is undefined.
pub fn log_returns(series: &[DailyClose]) -> Vec<f64> {
    series
        .windows(2)
        .filter(|w| w[0].close > 0.0 && w[1].close > 0.0)
        .map(|w| (w[1].close / w[0].close).ln())
        .collect()
}

/// Restrict a series to the trailing `days` calendar days (inclusive of the
/// last date). An empty series stays empty.
pub fn trailing_days(series: &[DailyClose], days: i64) -> Vec<DailyClose> {
    let Some(last) = series.last() else {
        return Vec::new();
    };
    let cutoff = last.date - chrono::Duration::days(days);
    series
        .iter()
        .filter(|c| c.date >= cutoff)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_series(closes: &[f64]) -> Vec<DailyClose> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| DailyClose {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
                    + chrono::Duration::days(i as i64),
                close,
            })
            .collect()
    }

    #[test]
    fn log_returns_basic() {
        let series = make_series(&[100.0, 110.0, 99.0]);
        let returns = log_returns(&series);
        assert_eq!(returns.len(), 2);
        assert_relative_eq!(returns[0], (110.0_f64 / 100.0).ln(), epsilon = 1e-12);
        assert_relative_eq!(returns[1], (99.0_f64 / 110.0).ln(), epsilon = 1e-12);
    }

    #[test]
    fn log_returns_skips_non_positive_closes() {
        let series = make_series(&[100.0, 0.0, 110.0]);
        assert!(log_returns(&series).is_empty());
    }

    #[test]
    fn log_returns_empty_input() {
        assert!(log_returns(&[]).is_empty());
        assert!(log_returns(&make_series(&[100.0])).is_empty());
    }

    #[test]
    fn trailing_days_cuts_old_dates() {
        let series = make_series(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let recent = trailing_days(&series, 2);
        assert_eq!(recent.len(), 3);
        assert_relative_eq!(recent[0].close, 3.0);
    }

    #[test]
    fn trailing_days_empty_series() {
        assert!(trailing_days(&[], 30).is_empty());
    }
}
