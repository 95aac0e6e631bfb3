//! Option strategy construction and suggestion.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::chain::{OptionChain, OptionSide};
use super::error::VolguardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

/// The multi-leg strategies the desk trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    IronFly,
    IronCondor,
    BullPutSpread,
    BearCallSpread,
}

impl FromStr for StrategyKind {
    type Err = VolguardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "iron_fly" => Ok(StrategyKind::IronFly),
            "iron_condor" => Ok(StrategyKind::IronCondor),
            "bull_put_spread" => Ok(StrategyKind::BullPutSpread),
            "bear_call_spread" => Ok(StrategyKind::BearCallSpread),
            other => Err(VolguardError::UnknownStrategy {
                name: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StrategyKind::IronFly => "iron_fly",
            StrategyKind::IronCondor => "iron_condor",
            StrategyKind::BullPutSpread => "bull_put_spread",
            StrategyKind::BearCallSpread => "bear_call_spread",
        };
        f.write_str(s)
    }
}

/// One leg of a strategy, ready to submit as an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyLeg {
    pub instrument_key: String,
    pub strike: f64,
    pub side: OptionSide,
    pub action: OrderAction,
    pub quantity: i64,
    pub order_type: OrderType,
    /// Quoted premium at build time, kept for P&L estimation.
    pub ltp: f64,
}

/// Build the legs for a strategy from a chain.
///
/// Wing strikes for iron fly / iron condor are exact offsets from the ATM
/// strike; spread strikes snap to the nearest listed strike around spot.
/// Legs without a quoted instrument are dropped with a warning; an empty
/// result is an error.
pub fn build_legs(
    chain: &OptionChain,
    spot: f64,
    kind: StrategyKind,
    quantity: i64,
    otm_distance: f64,
) -> Result<Vec<StrategyLeg>, VolguardError> {
    if chain.strikes.is_empty() {
        return Err(VolguardError::EmptyChain {
            instrument: chain.instrument_key.clone(),
            expiry: chain.expiry.to_string(),
        });
    }

    let atm = chain
        .strikes
        .iter()
        .map(|s| s.strike)
        .min_by(|a, b| (a - spot).abs().total_cmp(&(b - spot).abs()))
        .unwrap_or(spot);

    let nearest = |target: f64| -> f64 {
        chain
            .nearest_strike(target)
            .map(|e| e.strike)
            .unwrap_or(target)
    };

    let d = otm_distance;
    let template: Vec<(f64, OptionSide, OrderAction)> = match kind {
        StrategyKind::IronFly => vec![
            (atm, OptionSide::Call, OrderAction::Sell),
            (atm, OptionSide::Put, OrderAction::Sell),
            (atm + d, OptionSide::Call, OrderAction::Buy),
            (atm - d, OptionSide::Put, OrderAction::Buy),
        ],
        StrategyKind::IronCondor => vec![
            (atm + d, OptionSide::Call, OrderAction::Sell),
            (atm + 2.0 * d, OptionSide::Call, OrderAction::Buy),
            (atm - d, OptionSide::Put, OrderAction::Sell),
            (atm - 2.0 * d, OptionSide::Put, OrderAction::Buy),
        ],
        StrategyKind::BullPutSpread => vec![
            (nearest(spot - d), OptionSide::Put, OrderAction::Sell),
            (nearest(spot - 2.0 * d), OptionSide::Put, OrderAction::Buy),
        ],
        StrategyKind::BearCallSpread => vec![
            (nearest(spot + d), OptionSide::Call, OrderAction::Sell),
            (nearest(spot + 2.0 * d), OptionSide::Call, OrderAction::Buy),
        ],
    };

    let mut legs = Vec::with_capacity(template.len());
    for (strike, side, action) in template {
        match chain.quote(strike, side) {
            Some(quote) if !quote.instrument_key.is_empty() => legs.push(StrategyLeg {
                instrument_key: quote.instrument_key.clone(),
                strike,
                side,
                action,
                quantity,
                order_type: OrderType::Market,
                ltp: quote.ltp,
            }),
            _ => warn!(strike, side = side.code(), %kind, "no quote for leg, dropping"),
        }
    }

    if legs.is_empty() {
        return Err(VolguardError::NoLegs {
            strategy: kind.to_string(),
        });
    }
    Ok(legs)
}

/// Net entry premium: credit received from sells minus debit paid for buys.
pub fn entry_premium(legs: &[StrategyLeg]) -> f64 {
    legs.iter()
        .map(|leg| {
            let value = leg.ltp * leg.quantity as f64;
            match leg.action {
                OrderAction::Sell => value,
                OrderAction::Buy => -value,
            }
        })
        .sum()
}

/// Rough worst-case loss for the defined-risk strategies.
pub fn estimated_max_loss(kind: StrategyKind, otm_distance: f64, quantity: i64) -> f64 {
    let qty = quantity as f64;
    match kind {
        StrategyKind::IronFly => otm_distance * 2.0 * qty * 0.5,
        StrategyKind::IronCondor | StrategyKind::BullPutSpread | StrategyKind::BearCallSpread => {
            otm_distance * qty * 0.5
        }
    }
}

/// Market metrics feeding the suggestion engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestionInputs {
    pub ivp: f64,
    pub vix: f64,
    pub pcr: f64,
    pub straddle_price: f64,
    pub event_impact_score: f64,
    pub atm_iv: f64,
    pub realized_vol: f64,
    pub iv_skew_slope: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SuggestionRegime {
    HighVolatilityExpansion,
    LowVolatilityContraction,
    ExtremeSentiment,
    BearishSkew,
    Neutral,
}

impl fmt::Display for SuggestionRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SuggestionRegime::HighVolatilityExpansion => "High Volatility Expansion",
            SuggestionRegime::LowVolatilityContraction => "Low Volatility Contraction",
            SuggestionRegime::ExtremeSentiment => "Extreme Sentiment",
            SuggestionRegime::BearishSkew => "Bearish Skew",
            SuggestionRegime::Neutral => "Neutral",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub confidence: f64,
    pub max_loss_estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyAdvice {
    pub regime: SuggestionRegime,
    pub suggested_strategies: Vec<Suggestion>,
}

fn suggestion(name: &str, confidence: f64, max_loss_estimate: f64) -> Suggestion {
    Suggestion {
        name: name.to_string(),
        confidence,
        max_loss_estimate,
    }
}

/// Suggest strategies for the current metrics.
pub fn suggest(inputs: &SuggestionInputs) -> StrategyAdvice {
    let regime = if inputs.ivp > 60.0 && inputs.vix > 18.0 {
        SuggestionRegime::HighVolatilityExpansion
    } else if inputs.ivp < 30.0 && inputs.vix < 12.0 {
        SuggestionRegime::LowVolatilityContraction
    } else if inputs.pcr > 1.2 || inputs.pcr < 0.8 {
        SuggestionRegime::ExtremeSentiment
    } else if inputs.iv_skew_slope > 0.5 {
        SuggestionRegime::BearishSkew
    } else {
        SuggestionRegime::Neutral
    };

    let mut suggested = Vec::new();

    match regime {
        SuggestionRegime::HighVolatilityExpansion => suggested.push(suggestion(
            "Short Straddle / Strangle (for IV mean reversion)",
            0.8,
            5_000.0,
        )),
        SuggestionRegime::LowVolatilityContraction => suggested.push(suggestion(
            "Long Straddle / Strangle (for breakout)",
            0.7,
            4_000.0,
        )),
        _ => {}
    }

    if inputs.pcr > 1.2 {
        suggested.push(suggestion("Bull Put Spread", 0.6, 3_000.0));
    } else if inputs.pcr < 0.8 {
        suggested.push(suggestion("Bear Call Spread", 0.6, 3_000.0));
    }

    if inputs.ivp >= 50.0 && inputs.vix > 13.5 && inputs.straddle_price >= 150.0 {
        suggested.push(suggestion(
            "Iron Fly (for range-bound with high IV)",
            0.75,
            5_000.0,
        ));
    } else if inputs.vix < 12.0 && (0.9..=1.1).contains(&inputs.pcr) {
        suggested.push(suggestion(
            "Short Strangle (for low volatility, sideways)",
            0.7,
            3_500.0,
        ));
    }

    if suggested.is_empty() {
        suggested.push(suggestion(
            "No clear strategy suggested by current metrics. Exercise caution.",
            0.0,
            0.0,
        ));
    }

    StrategyAdvice {
        regime,
        suggested_strategies: suggested,
    }
}
