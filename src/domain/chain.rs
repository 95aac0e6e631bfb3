//! Option chain representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    /// NSE-style suffix, CE for calls and PE for puts.
    pub fn code(&self) -> &'static str {
        match self {
            OptionSide::Call => "CE",
            OptionSide::Put => "PE",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
    pub iv: f64,
}

/// Quoted market data for one option contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionQuote {
    pub instrument_key: String,
    pub ltp: f64,
    pub close_price: f64,
    pub bid_price: f64,
    pub ask_price: f64,
    pub bid_qty: i64,
    pub ask_qty: i64,
    pub volume: i64,
    pub oi: i64,
    #[serde(default)]
    pub greeks: Greeks,
}

impl OptionQuote {
    pub fn bid_ask_spread(&self) -> f64 {
        self.ask_price - self.bid_price
    }

    /// Traded volume relative to open interest, +1 in the denominator so a
    /// zero-OI strike still yields a finite ratio.
    pub fn volume_oi_ratio(&self) -> f64 {
        self.volume as f64 / (self.oi as f64 + 1.0)
    }
}

/// Both sides of one strike.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrikeEntry {
    pub strike: f64,
    /// Put/call OI ratio reported by the exchange for this strike.
    #[serde(default)]
    pub pcr: f64,
    pub call: Option<OptionQuote>,
    pub put: Option<OptionQuote>,
}

impl StrikeEntry {
    pub fn quote(&self, side: OptionSide) -> Option<&OptionQuote> {
        match side {
            OptionSide::Call => self.call.as_ref(),
            OptionSide::Put => self.put.as_ref(),
        }
    }
}

/// A full option chain for one underlying and expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionChain {
    pub instrument_key: String,
    pub spot: f64,
    pub expiry: NaiveDate,
    pub strikes: Vec<StrikeEntry>,
}

impl OptionChain {
    /// The strike closest to spot. None for an empty chain.
    pub fn atm_strike(&self) -> Option<f64> {
        self.strikes
            .iter()
            .map(|s| s.strike)
            .min_by(|a, b| {
                (a - self.spot)
                    .abs()
                    .total_cmp(&(b - self.spot).abs())
            })
    }

    /// The strike entry closest to a target price.
    pub fn nearest_strike(&self, target: f64) -> Option<&StrikeEntry> {
        self.strikes.iter().min_by(|a, b| {
            (a.strike - target)
                .abs()
                .total_cmp(&(b.strike - target).abs())
        })
    }

    pub fn entry_at(&self, strike: f64) -> Option<&StrikeEntry> {
        self.strikes.iter().find(|s| s.strike == strike)
    }

    pub fn quote(&self, strike: f64, side: OptionSide) -> Option<&OptionQuote> {
        self.entry_at(strike).and_then(|e| e.quote(side))
    }

    /// Calendar days until expiry, floored at zero.
    pub fn days_to_expiry(&self, today: NaiveDate) -> i64 {
        (self.expiry - today).num_days().max(0)
    }
}

/// Strike price relative to spot.
pub fn moneyness(strike: f64, spot: f64) -> f64 {
    if spot == 0.0 { 0.0 } else { strike / spot }
}

/// Exercise value of an option at the given spot.
pub fn intrinsic_value(side: OptionSide, strike: f64, spot: f64) -> f64 {
    match side {
        OptionSide::Call => (spot - strike).max(0.0),
        OptionSide::Put => (strike - spot).max(0.0),
    }
}

/// Premium in excess of intrinsic value.
pub fn time_value(side: OptionSide, strike: f64, spot: f64, ltp: f64) -> f64 {
    ltp - intrinsic_value(side, strike, spot)
}
