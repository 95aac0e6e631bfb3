//! Trade log records and performance aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A trade to be recorded. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrade {
    pub strategy: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub regime_score: f64,
}

/// A logged trade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub id: i64,
    pub strategy: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub regime_score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Aggregated performance over the trade log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub total_trades: usize,
    pub total_pnl: f64,
    pub avg_regime_score: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
}

impl Performance {
    pub fn compute(trades: &[TradeRecord]) -> Self {
        let total = trades.len();
        if total == 0 {
            return Self {
                total_trades: 0,
                total_pnl: 0.0,
                avg_regime_score: 0.0,
                winning_trades: 0,
                losing_trades: 0,
            };
        }

        let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
        let avg_regime_score =
            trades.iter().map(|t| t.regime_score).sum::<f64>() / total as f64;

        Self {
            total_trades: total,
            total_pnl: (total_pnl * 100.0).round() / 100.0,
            avg_regime_score: (avg_regime_score * 100.0).round() / 100.0,
            winning_trades: trades.iter().filter(|t| t.pnl > 0.0).count(),
            losing_trades: trades.iter().filter(|t| t.pnl < 0.0).count(),
        }
    }
}
