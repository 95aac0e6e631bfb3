//! Trade logging, performance and risk analytics endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::adapters::web::{ApiError, AppState};
use crate::domain::regime::{RegimeInputs, score_regime};
use crate::domain::risk::{
    DisciplineReport, RiskAssessment, RiskCheckInputs, check_risk, discipline_score,
};
use crate::domain::trade_log::{NewTrade, Performance};

#[derive(Debug, Serialize)]
pub struct LogTradeResponse {
    pub status: &'static str,
    pub trade_id: i64,
}

pub async fn log_trade(
    State(state): State<Arc<AppState>>,
    Json(trade): Json<NewTrade>,
) -> Result<Json<LogTradeResponse>, ApiError> {
    let trade_id = state.trade_store.insert_trade(&trade)?;
    Ok(Json(LogTradeResponse {
        status: "success",
        trade_id,
    }))
}

pub async fn performance(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Performance>, ApiError> {
    let trades = state.trade_store.list_trades()?;
    Ok(Json(Performance::compute(&trades)))
}

pub async fn risk_check(
    Json(inputs): Json<RiskCheckInputs>,
) -> Result<Json<RiskAssessment>, ApiError> {
    Ok(Json(check_risk(&inputs)))
}

#[derive(Debug, Serialize)]
pub struct RegimeScoreResponse {
    pub regime_score: i32,
    pub regime: String,
    pub explanation: Vec<String>,
}

pub async fn regime_score(
    Json(inputs): Json<RegimeInputs>,
) -> Result<Json<RegimeScoreResponse>, ApiError> {
    let assessment = score_regime(&inputs);
    Ok(Json(RegimeScoreResponse {
        regime_score: assessment.score,
        regime: assessment.regime.to_string(),
        explanation: assessment.explanation,
    }))
}

pub async fn discipline(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DisciplineReport>, ApiError> {
    let trades = state.trade_store.list_trades()?;
    Ok(Json(discipline_score(&trades)))
}
