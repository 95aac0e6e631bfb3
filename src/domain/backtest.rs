//! Simplified strategy backtest over underlying closes.
//!
//! Real historical option chains are not available, so each day a synthetic
//! chain is built around the ATM strike: intrinsic value plus a seeded
//! pseudo-random extrinsic premium. Legs are marked to the next day's close
//! with decayed extrinsic. Deterministic across runs (fixed RNG seed).

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::chain::{OptionChain, OptionQuote, OptionSide, StrikeEntry, intrinsic_value};
use super::error::VolguardError;
use super::series::{DailyClose, trailing_days};
use super::strategy::{self, OrderAction, StrategyKind};

const STRIKE_STEP: f64 = 50.0;
const WING_SPAN: i64 = 4;
const OTM_DISTANCE: f64 = 50.0;
const RNG_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BacktestParams {
    pub strategy: StrategyKind,
    pub quantity: i64,
    /// Trailing calendar days of history to simulate over.
    pub period_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub total_pnl: f64,
    pub win_rate: f64,
    pub avg_pnl_per_trade: f64,
    pub max_drawdown: f64,
    pub pnl_history: Vec<DailyPnl>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn synthetic_quote(
    date: NaiveDate,
    side: OptionSide,
    strike: f64,
    spot: f64,
    rng: &mut StdRng,
) -> OptionQuote {
    let extrinsic = if (strike - spot).abs() < 100.0 {
        rng.gen_range(5.0..25.0)
    } else {
        rng.gen_range(1.0..10.0)
    };
    OptionQuote {
        instrument_key: format!(
            "NSE_FO|NIFTY|{}{}{}",
            date.format("%Y%m%d"),
            side.code(),
            strike as i64
        ),
        ltp: intrinsic_value(side, strike, spot) + extrinsic,
        ..Default::default()
    }
}

fn synthetic_chain(date: NaiveDate, spot: f64, rng: &mut StdRng) -> OptionChain {
    let atm = (spot / STRIKE_STEP).round() * STRIKE_STEP;
    let strikes = (-WING_SPAN..=WING_SPAN)
        .map(|i| {
            let strike = atm + i as f64 * STRIKE_STEP;
            StrikeEntry {
                strike,
                pcr: 0.0,
                call: Some(synthetic_quote(date, OptionSide::Call, strike, spot, rng)),
                put: Some(synthetic_quote(date, OptionSide::Put, strike, spot, rng)),
            }
        })
        .collect();

    OptionChain {
        instrument_key: "NSE_INDEX|Nifty 50".into(),
        spot,
        expiry: date,
        strikes,
    }
}

/// Run the simulation over the trailing window of closes.
pub fn run_backtest(
    closes: &[DailyClose],
    params: &BacktestParams,
) -> Result<BacktestReport, VolguardError> {
    let window = trailing_days(closes, params.period_days);
    if window.len() < 2 {
        return Err(VolguardError::InsufficientData {
            context: "backtest closes".into(),
            have: window.len(),
            need: 2,
        });
    }

    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let mut pnl_history = Vec::with_capacity(window.len() - 1);

    for pair in window.windows(2) {
        let today = &pair[0];
        let next_close = pair[1].close;

        let chain = synthetic_chain(today.date, today.close, &mut rng);
        let legs = strategy::build_legs(
            &chain,
            today.close,
            params.strategy,
            params.quantity,
            OTM_DISTANCE,
        )?;

        let mut daily_pnl = 0.0;
        for leg in &legs {
            let entry = leg.ltp;
            let exit_intrinsic = intrinsic_value(leg.side, leg.strike, next_close);
            let decay = rng.gen_range(0.1..0.5);
            let exit = (exit_intrinsic + decay * (entry - exit_intrinsic)).max(0.01);
            let qty = leg.quantity as f64;
            daily_pnl += match leg.action {
                OrderAction::Sell => (entry - exit) * qty,
                OrderAction::Buy => (exit - entry) * qty,
            };
        }

        pnl_history.push(DailyPnl {
            date: today.date,
            pnl: daily_pnl,
        });
    }

    let total_pnl: f64 = pnl_history.iter().map(|p| p.pnl).sum();
    let trades = pnl_history.len();
    let wins = pnl_history.iter().filter(|p| p.pnl > 0.0).count();

    let mut running = 0.0;
    let mut peak = 0.0;
    let mut max_drawdown = 0.0_f64;
    for p in &pnl_history {
        running += p.pnl;
        if running > peak {
            peak = running;
        }
        max_drawdown = max_drawdown.max(peak - running);
    }

    Ok(BacktestReport {
        total_pnl: round2(total_pnl),
        win_rate: round2(wins as f64 / trades as f64),
        avg_pnl_per_trade: round2(total_pnl / trades as f64),
        max_drawdown: round2(max_drawdown),
        pnl_history,
    })
}
