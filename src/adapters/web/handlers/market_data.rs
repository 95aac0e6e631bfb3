//! Live option chain endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adapters::web::{ApiError, AppState};
use crate::domain::chain_metrics::{ChainMetrics, StrikeRow, analyze_chain};
use crate::domain::volatility::realized_vol_7d;

fn default_instrument() -> String {
    "NSE_INDEX|Nifty 50".to_string()
}

#[derive(Debug, Deserialize)]
pub struct OptionChainRequest {
    pub access_token: String,
    #[serde(default = "default_instrument")]
    pub instrument_key: String,
}

#[derive(Debug, Serialize)]
pub struct OptionChainResponse {
    pub instrument_key: String,
    pub spot: f64,
    pub atm_strike: f64,
    pub straddle_price: f64,
    pub pcr: f64,
    pub max_pain: f64,
    pub expiry: NaiveDate,
    pub iv_skew_data: Vec<StrikeRow>,
    pub atm_iv: f64,
    pub realized_volatility: f64,
    pub timestamp: DateTime<Utc>,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Fetch the nearest-expiry chain, analyze it and return the snapshot.
pub async fn option_chain(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OptionChainRequest>,
) -> Result<Json<OptionChainResponse>, ApiError> {
    let expiries = state
        .broker
        .expiries(&req.access_token, &req.instrument_key)
        .await?;
    let expiry = *expiries
        .first()
        .ok_or_else(|| ApiError::internal("broker returned no expiries"))?;

    let chain = state
        .broker
        .option_chain(&req.access_token, &req.instrument_key, expiry)
        .await?;

    let analysis = {
        let mut store = state
            .oi_store
            .lock()
            .map_err(|_| ApiError::internal("OI store lock poisoned"))?;
        analyze_chain(&chain, &mut store)
    };
    let metrics = ChainMetrics::compute(&analysis, chain.spot);

    // a broken history file must not take the market-data endpoint down
    let realized_volatility = match state.history.daily_closes() {
        Ok(closes) => realized_vol_7d(&closes),
        Err(err) => {
            warn!(%err, "history unavailable, reporting zero realized vol");
            0.0
        }
    };

    info!(
        instrument = %req.instrument_key,
        %expiry,
        strikes = analysis.rows.len(),
        "served option chain snapshot"
    );

    Ok(Json(OptionChainResponse {
        instrument_key: req.instrument_key,
        spot: chain.spot,
        atm_strike: metrics.atm_strike,
        straddle_price: metrics.straddle_price,
        pcr: round2(metrics.pcr),
        max_pain: metrics.max_pain,
        expiry,
        iv_skew_data: analysis.rows,
        atm_iv: round2(metrics.atm_iv),
        realized_volatility,
        timestamp: Utc::now(),
    }))
}
