//! Direct order placement and account-funds endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::adapters::web::{ApiError, AppState};
use crate::ports::broker_port::{FundsAndMargin, OrderReceipt, OrderRequest};

use super::TokenRequest;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub access_token: String,
    #[serde(flatten)]
    pub order: OrderRequest,
}

pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaceOrderRequest>,
) -> Result<Json<OrderReceipt>, ApiError> {
    let receipt = state
        .broker
        .place_order(&req.access_token, &req.order)
        .await?;
    Ok(Json(receipt))
}

#[derive(Debug, Deserialize)]
pub struct TradePnlRequest {
    pub access_token: String,
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct TradePnlResponse {
    pub pnl: f64,
}

pub async fn order_pnl(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TradePnlRequest>,
) -> Result<Json<TradePnlResponse>, ApiError> {
    let pnl = state
        .broker
        .order_pnl(&req.access_token, &req.order_id)
        .await?;
    Ok(Json(TradePnlResponse { pnl }))
}

pub async fn funds_margin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<FundsAndMargin>, ApiError> {
    let funds = state.broker.funds_and_margin(&req.access_token).await?;
    Ok(Json(funds))
}
