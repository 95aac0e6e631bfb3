//! Realized and historical volatility.
//!
//! All figures are annualized percentages: standard deviation of daily log
//! returns scaled by sqrt(252) * 100.

use std::collections::BTreeMap;

use tracing::warn;

use super::series::{DailyClose, log_returns};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Sample standard deviation (n - 1 denominator). Zero when fewer than two
/// observations.
fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    variance.sqrt()
}

fn annualize(daily_std: f64) -> f64 {
    daily_std * TRADING_DAYS_PER_YEAR.sqrt() * 100.0
}

/// 7-day realized volatility from daily closes. Returns 0.0 (with a warning)
/// when there are not enough closes for seven returns.
pub fn realized_vol_7d(closes: &[DailyClose]) -> f64 {
    let returns = log_returns(closes);
    if returns.len() < 7 {
        warn!(
            have = returns.len(),
            "not enough returns for 7-day realized volatility"
        );
        return 0.0;
    }
    let last7 = &returns[returns.len() - 7..];
    let vol = annualize(sample_std(last7));
    if vol.is_nan() { 0.0 } else { vol }
}

/// Historical volatility over the trailing `window` returns. Returns 0.0
/// when the series is shorter than the window.
pub fn historical_vol(closes: &[DailyClose], window: usize) -> f64 {
    let returns = log_returns(closes);
    if returns.len() < window {
        return 0.0;
    }
    let tail = &returns[returns.len() - window..];
    annualize(sample_std(tail))
}

/// Supported historical-volatility lookback periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HvPeriod {
    Days7,
    Days30,
    Year1,
}

impl HvPeriod {
    pub const ALL: [HvPeriod; 3] = [HvPeriod::Days7, HvPeriod::Days30, HvPeriod::Year1];

    pub fn window(&self) -> usize {
        match self {
            HvPeriod::Days7 => 7,
            HvPeriod::Days30 => 30,
            HvPeriod::Year1 => 252,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HvPeriod::Days7 => "hv_7d",
            HvPeriod::Days30 => "hv_30d",
            HvPeriod::Year1 => "hv_1y",
        }
    }

    /// Parse a query-string period. `all` selects every period; anything
    /// unrecognized is None.
    pub fn parse_selection(s: &str) -> Option<Vec<HvPeriod>> {
        match s {
            "all" => Some(Self::ALL.to_vec()),
            "7d" => Some(vec![HvPeriod::Days7]),
            "30d" => Some(vec![HvPeriod::Days30]),
            "1y" => Some(vec![HvPeriod::Year1]),
            _ => None,
        }
    }
}

/// Historical volatility for each requested period, keyed by label.
pub fn hv_report(closes: &[DailyClose], periods: &[HvPeriod]) -> BTreeMap<String, f64> {
    periods
        .iter()
        .map(|p| {
            let vol = historical_vol(closes, p.window());
            (p.label().to_string(), (vol * 100.0).round() / 100.0)
        })
        .collect()
}
