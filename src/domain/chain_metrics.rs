//! Per-strike analysis and chain-level metrics.
//!
//! `analyze_chain` flattens an [`OptionChain`] into [`StrikeRow`]s with OI
//! deltas against the previous snapshot, then `ChainMetrics::compute` derives
//! the headline numbers (PCR, max pain, ATM straddle, ATM IV).

use std::collections::HashMap;

use serde::Serialize;

use super::chain::{OptionChain, OptionQuote, OptionSide};

/// Open interest remembered from the previous chain snapshot, keyed by
/// (strike, side). Used to report OI change between polls.
#[derive(Debug, Default)]
pub struct OiStore {
    previous: HashMap<(i64, OptionSide), i64>,
}

impl OiStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, strike: f64, side: OptionSide) -> Option<i64> {
        self.previous.get(&(strike.round() as i64, side)).copied()
    }

    fn put(&mut self, strike: f64, side: OptionSide, oi: i64) {
        self.previous.insert((strike.round() as i64, side), oi);
    }
}

/// One analyzed strike, both sides flattened. This is the row shape returned
/// by the option-chain endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StrikeRow {
    pub strike: f64,
    pub ce_ltp: f64,
    pub ce_iv: f64,
    pub ce_delta: f64,
    pub ce_theta: f64,
    pub ce_vega: f64,
    pub ce_oi: i64,
    pub ce_oi_change: i64,
    pub ce_oi_change_pct: f64,
    pub ce_volume: i64,
    pub ce_instrument_key: String,
    pub pe_ltp: f64,
    pub pe_iv: f64,
    pub pe_delta: f64,
    pub pe_theta: f64,
    pub pe_vega: f64,
    pub pe_oi: i64,
    pub pe_oi_change: i64,
    pub pe_oi_change_pct: f64,
    pub pe_volume: i64,
    pub pe_instrument_key: String,
    pub strike_pcr: f64,
    pub oi_skew: f64,
    pub iv_skew_slope: f64,
}

/// Analyzed chain: rows in ascending strike order plus OI totals.
#[derive(Debug, Clone)]
pub struct ChainAnalysis {
    pub rows: Vec<StrikeRow>,
    pub ce_oi_total: i64,
    pub pe_oi_total: i64,
}

fn oi_change(current: i64, previous: Option<i64>) -> (i64, f64) {
    match previous {
        Some(prev) => {
            let change = current - prev;
            let pct = if prev != 0 {
                change as f64 / prev as f64 * 100.0
            } else {
                0.0
            };
            (change, pct)
        }
        None => (0, 0.0),
    }
}

fn fill_side(row: &mut StrikeRow, side: OptionSide, quote: &OptionQuote, store: &OiStore) {
    let (change, pct) = oi_change(quote.oi, store.get(row.strike, side));
    match side {
        OptionSide::Call => {
            row.ce_ltp = quote.ltp;
            row.ce_iv = quote.greeks.iv;
            row.ce_delta = quote.greeks.delta;
            row.ce_theta = quote.greeks.theta;
            row.ce_vega = quote.greeks.vega;
            row.ce_oi = quote.oi;
            row.ce_oi_change = change;
            row.ce_oi_change_pct = pct;
            row.ce_volume = quote.volume;
            row.ce_instrument_key = quote.instrument_key.clone();
        }
        OptionSide::Put => {
            row.pe_ltp = quote.ltp;
            row.pe_iv = quote.greeks.iv;
            row.pe_delta = quote.greeks.delta;
            row.pe_theta = quote.greeks.theta;
            row.pe_vega = quote.greeks.vega;
            row.pe_oi = quote.oi;
            row.pe_oi_change = change;
            row.pe_oi_change_pct = pct;
            row.pe_volume = quote.volume;
            row.pe_instrument_key = quote.instrument_key.clone();
        }
    }
}

/// Flatten the chain into strike rows, updating the OI store in place so the
/// next snapshot reports deltas against this one.
pub fn analyze_chain(chain: &OptionChain, store: &mut OiStore) -> ChainAnalysis {
    let mut rows: Vec<StrikeRow> = Vec::with_capacity(chain.strikes.len());
    let mut ce_oi_total = 0i64;
    let mut pe_oi_total = 0i64;

    for entry in &chain.strikes {
        let mut row = StrikeRow {
            strike: entry.strike,
            ..Default::default()
        };
        if let Some(call) = &entry.call {
            fill_side(&mut row, OptionSide::Call, call, store);
            ce_oi_total += call.oi;
        }
        if let Some(put) = &entry.put {
            fill_side(&mut row, OptionSide::Put, put, store);
            pe_oi_total += put.oi;
        }
        row.strike_pcr = row.pe_oi as f64 / if row.ce_oi != 0 { row.ce_oi as f64 } else { 1.0 };
        row.oi_skew =
            (row.pe_oi - row.ce_oi) as f64 / (row.pe_oi + row.ce_oi + 1) as f64;
        rows.push(row);
    }

    rows.sort_by(|a, b| a.strike.total_cmp(&b.strike));

    for row in &rows {
        store.put(row.strike, OptionSide::Call, row.ce_oi);
        store.put(row.strike, OptionSide::Put, row.pe_oi);
    }

    apply_iv_skew_slope(&mut rows);

    ChainAnalysis {
        rows,
        ce_oi_total,
        pe_oi_total,
    }
}

/// 3-point trailing mean of |PE IV - CE IV| over strikes where both sides
/// have positive IV. Strikes with a missing side stay at zero, and the whole
/// column stays zero unless at least 3 strikes are valid.
fn apply_iv_skew_slope(rows: &mut [StrikeRow]) {
    let valid: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, r)| r.ce_iv > 0.0 && r.pe_iv > 0.0)
        .map(|(i, _)| i)
        .collect();

    if valid.len() < 3 {
        return;
    }

    let diffs: Vec<f64> = valid
        .iter()
        .map(|&i| (rows[i].pe_iv - rows[i].ce_iv).abs())
        .collect();

    for (pos, &i) in valid.iter().enumerate() {
        let start = pos.saturating_sub(2);
        let window = &diffs[start..=pos];
        rows[i].iv_skew_slope = window.iter().sum::<f64>() / window.len() as f64;
    }
}

/// Headline metrics derived from an analyzed chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainMetrics {
    pub pcr: f64,
    pub max_pain: f64,
    pub straddle_price: f64,
    pub atm_strike: f64,
    pub atm_iv: f64,
}

impl ChainMetrics {
    pub fn compute(analysis: &ChainAnalysis, spot: f64) -> Self {
        let atm = analysis.rows.iter().min_by(|a, b| {
            (a.strike - spot)
                .abs()
                .total_cmp(&(b.strike - spot).abs())
        });
        let Some(atm) = atm else {
            return Self {
                pcr: 0.0,
                max_pain: 0.0,
                straddle_price: 0.0,
                atm_strike: 0.0,
                atm_iv: 0.0,
            };
        };

        let pcr = analysis.pe_oi_total as f64
            / if analysis.ce_oi_total != 0 {
                analysis.ce_oi_total as f64
            } else {
                1.0
            };

        let max_pain = max_pain(&analysis.rows).unwrap_or(spot);

        Self {
            pcr,
            max_pain,
            straddle_price: atm.ce_ltp + atm.pe_ltp,
            atm_strike: atm.strike,
            atm_iv: (atm.ce_iv + atm.pe_iv) / 2.0,
        }
    }
}

/// The expiry price at which aggregate option-writer payout is smallest:
/// for each candidate strike K, sum CE OI weighted by (K - strike) over
/// in-the-money calls and PE OI weighted by (strike - K) over in-the-money
/// puts, then take the K with minimum total.
pub fn max_pain(rows: &[StrikeRow]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }

    let mut best: Option<(f64, f64)> = None;
    for candidate in rows {
        let k = candidate.strike;
        let mut pain = 0.0;
        for row in rows {
            if row.strike < k {
                pain += row.ce_oi as f64 * (k - row.strike);
            }
            if row.strike > k {
                pain += row.pe_oi as f64 * (row.strike - k);
            }
        }
        match best {
            Some((_, best_pain)) if pain >= best_pain => {}
            _ => best = Some((k, pain)),
        }
    }
    best.map(|(k, _)| k)
}
