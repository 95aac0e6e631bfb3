//! Volatility forecast and history endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use crate::adapters::web::{ApiError, AppState};
use crate::domain::forecast::{ForecastInputs, LinearForecaster};
use crate::domain::garch::{GarchPoint, forecast_annualized};
use crate::domain::volatility::{HvPeriod, hv_report};

const GARCH_HORIZON: usize = 7;

#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    pub predicted_volatility_7d: f64,
}

/// Linear-model 7-day volatility forecast from current market features.
pub async fn forecast(
    Json(inputs): Json<ForecastInputs>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let model = LinearForecaster::default();
    let predicted = model.predict(&inputs);
    Ok(Json(ForecastResponse {
        predicted_volatility_7d: (predicted * 100.0).round() / 100.0,
    }))
}

#[derive(Debug, Serialize)]
pub struct GarchResponse {
    pub horizon_days: usize,
    pub forecast: Vec<GarchPoint>,
}

/// GARCH(1,1) forecast over the configured history series.
pub async fn garch(State(state): State<Arc<AppState>>) -> Result<Json<GarchResponse>, ApiError> {
    let closes = state.history.daily_closes()?;
    let forecast = forecast_annualized(&closes, GARCH_HORIZON)?;
    Ok(Json(GarchResponse {
        horizon_days: GARCH_HORIZON,
        forecast,
    }))
}

fn default_period() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize)]
pub struct HistoricalParams {
    #[serde(default = "default_period")]
    pub period: String,
}

/// Historical volatility for 7d/30d/1y windows.
pub async fn historical(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoricalParams>,
) -> Result<Json<BTreeMap<String, f64>>, ApiError> {
    let periods = HvPeriod::parse_selection(&params.period).ok_or_else(|| {
        ApiError::bad_request("invalid period, choose from '7d', '30d', '1y', 'all'")
    })?;

    let closes = state.history.daily_closes()?;
    Ok(Json(hv_report(&closes, &periods)))
}
