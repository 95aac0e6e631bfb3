//! CSV history adapter for underlying daily closes.
//!
//! Reads an NSE-style export with `Date` (%d-%b-%Y) and `Close` columns.
//! Extra columns are ignored; rows with an unparsable date are skipped.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::error::VolguardError;
use crate::domain::series::DailyClose;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;

pub struct CsvHistoryAdapter {
    path: PathBuf,
}

impl CsvHistoryAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VolguardError> {
        let path =
            config
                .get_string("history", "csv_path")
                .ok_or_else(|| VolguardError::ConfigMissing {
                    section: "history".into(),
                    key: "csv_path".into(),
                })?;
        Ok(Self::new(PathBuf::from(path)))
    }

    fn history_error(&self, reason: impl Into<String>) -> VolguardError {
        VolguardError::History {
            source_name: self.path.display().to_string(),
            reason: reason.into(),
        }
    }
}

impl HistoryPort for CsvHistoryAdapter {
    fn daily_closes(&self) -> Result<Vec<DailyClose>, VolguardError> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| self.history_error(format!("failed to read: {e}")))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| self.history_error(format!("CSV parse error: {e}")))?
            .clone();
        let col = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let date_col = col("Date").ok_or_else(|| self.history_error("missing Date column"))?;
        let close_col = col("Close").ok_or_else(|| self.history_error("missing Close column"))?;

        let mut closes = Vec::new();
        for result in rdr.records() {
            let record =
                result.map_err(|e| self.history_error(format!("CSV parse error: {e}")))?;

            let date_str = record.get(date_col).unwrap_or("").trim();
            let Ok(date) = NaiveDate::parse_from_str(date_str, "%d-%b-%Y") else {
                warn!(row = date_str, "skipping row with unparsable date");
                continue;
            };

            let close: f64 = record
                .get(close_col)
                .unwrap_or("")
                .trim()
                .replace(',', "")
                .parse()
                .map_err(|e| self.history_error(format!("invalid close value: {e}")))?;

            closes.push(DailyClose { date, close });
        }

        closes.sort_by_key(|c| c.date);
        Ok(closes)
    }
}
