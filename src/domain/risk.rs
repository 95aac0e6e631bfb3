//! Pre-trade risk checks and the trading discipline score.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::trade_log::TradeRecord;

/// Inputs for a pre-trade risk check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCheckInputs {
    pub strategy: String,
    pub max_loss_allowed: f64,
    pub estimated_loss: f64,
    pub daily_pnl: f64,
    pub max_daily_limit: f64,
    pub iv_rv_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskVerdict {
    Allow,
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub status: RiskVerdict,
    pub alerts: Vec<String>,
}

/// Check a candidate trade against loss limits.
///
/// The estimated loss is inflated when implied vol runs above realized
/// (iv_rv_ratio > 1), since short-premium losses scale with the vol gap.
pub fn check_risk(inputs: &RiskCheckInputs) -> RiskAssessment {
    let mut alerts = Vec::new();

    let vol_factor = if inputs.iv_rv_ratio > 1.0 {
        1.0 + (inputs.iv_rv_ratio - 1.0) * 0.5
    } else {
        1.0
    };
    let adjusted_loss = inputs.estimated_loss * vol_factor;

    if adjusted_loss > inputs.max_loss_allowed {
        alerts.push(format!(
            "Max loss exceeded: Projected loss {:.2} > Allowed {:.2}",
            adjusted_loss, inputs.max_loss_allowed
        ));
    }

    let potential_daily_pnl = inputs.daily_pnl - adjusted_loss;
    if potential_daily_pnl < -inputs.max_daily_limit.abs() {
        alerts.push(format!(
            "Daily loss limit breached: Current + Projected P&L {:.2} < Daily limit -{:.2}",
            potential_daily_pnl, inputs.max_daily_limit
        ));
    }

    RiskAssessment {
        status: if alerts.is_empty() {
            RiskVerdict::Allow
        } else {
            RiskVerdict::Block
        },
        alerts,
    }
}

/// Regime score below which a trade counts as high-risk.
const HIGH_RISK_REGIME_SCORE: f64 = 3.0;
/// More trades than this in one day counts as overtrading.
const MAX_TRADES_PER_DAY: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisciplineReport {
    pub score: i32,
    pub violations: Vec<String>,
}

/// Score trading discipline out of 100 from the trade log.
pub fn discipline_score(trades: &[TradeRecord]) -> DisciplineReport {
    if trades.is_empty() {
        return DisciplineReport {
            score: 100,
            violations: Vec::new(),
        };
    }

    let mut violations = Vec::new();
    let total = trades.len();
    let mut score = 100;

    let high_risk = trades
        .iter()
        .filter(|t| t.regime_score < HIGH_RISK_REGIME_SCORE)
        .count();
    if high_risk as f64 / total as f64 > 0.2 {
        violations.push("Too many high-risk trades (low regime score)".to_string());
        score -= 20;
    }

    let mut daily: HashMap<NaiveDate, usize> = HashMap::new();
    for t in trades {
        *daily.entry(t.timestamp.date_naive()).or_insert(0) += 1;
    }
    let overtrading_days = daily
        .values()
        .filter(|&&count| count > MAX_TRADES_PER_DAY)
        .count();
    if overtrading_days > 0 {
        violations.push(format!(
            "Overtrading on {overtrading_days} days (>{MAX_TRADES_PER_DAY} trades/day)"
        ));
        score -= 10 * overtrading_days as i32;
    }

    let losing = trades.iter().filter(|t| t.pnl < 0.0).count();
    if losing as f64 / total as f64 > 0.5 {
        violations.push("More than 50% trades are losing".to_string());
        score -= 20;
    }

    DisciplineReport {
        score: score.max(0),
        violations,
    }
}
