//! Strategy suggestion, execution and backtest endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::adapters::web::{ApiError, AppState};
use crate::domain::backtest::{BacktestParams, BacktestReport, run_backtest};
use crate::domain::chain::OptionChain;
use crate::domain::strategy::{
    self, StrategyAdvice, StrategyKind, StrategyLeg, SuggestionInputs,
};
use crate::ports::broker_port::{OrderReceipt, OrderRequest};

/// Settle time between placing a leg and polling its fills.
const PNL_POLL_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

pub async fn suggest(
    Json(inputs): Json<SuggestionInputs>,
) -> Result<Json<StrategyAdvice>, ApiError> {
    Ok(Json(strategy::suggest(&inputs)))
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub access_token: String,
    pub strategy_name: String,
    pub spot_price: f64,
    pub quantity: i64,
    pub otm_distance: f64,
    pub option_chain: OptionChain,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub order_results: Vec<OrderReceipt>,
    pub trade_pnl_simulation: f64,
    pub estimated_entry_premium: f64,
    pub estimated_max_loss: f64,
    pub legs_attempted: Vec<StrategyLeg>,
}

/// Build the strategy's legs from the supplied chain and place them with the
/// broker. A failed leg is logged and skipped; remaining legs still go out.
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let kind: StrategyKind = req.strategy_name.parse()?;
    let legs = strategy::build_legs(
        &req.option_chain,
        req.spot_price,
        kind,
        req.quantity,
        req.otm_distance,
    )?;

    let estimated_entry_premium = strategy::entry_premium(&legs);
    let estimated_max_loss = strategy::estimated_max_loss(kind, req.otm_distance, req.quantity);

    let mut order_results = Vec::with_capacity(legs.len());
    let mut trade_pnl_simulation = 0.0;

    for leg in &legs {
        let order = OrderRequest::from(leg);
        match state.broker.place_order(&req.access_token, &order).await {
            Ok(receipt) => {
                tokio::time::sleep(PNL_POLL_DELAY).await;
                match state
                    .broker
                    .order_pnl(&req.access_token, &receipt.order_id)
                    .await
                {
                    Ok(pnl) => trade_pnl_simulation += pnl,
                    Err(err) => error!(order_id = %receipt.order_id, %err, "P&L poll failed"),
                }
                order_results.push(receipt);
            }
            Err(err) => {
                error!(instrument = %leg.instrument_key, %err, "order placement failed for leg");
            }
        }
    }

    info!(
        %kind,
        placed = order_results.len(),
        attempted = legs.len(),
        "strategy execution finished"
    );

    Ok(Json(ExecuteResponse {
        order_results,
        trade_pnl_simulation,
        estimated_entry_premium,
        estimated_max_loss,
        legs_attempted: legs,
    }))
}

#[derive(Debug, Deserialize)]
pub struct BacktestRequest {
    pub strategy_name: String,
    pub quantity: i64,
    /// Trailing calendar days to simulate over.
    pub period: i64,
}

pub async fn backtest(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BacktestRequest>,
) -> Result<Json<BacktestReport>, ApiError> {
    let kind: StrategyKind = req.strategy_name.parse()?;
    let closes = state.history.daily_closes()?;
    let report = run_backtest(
        &closes,
        &BacktestParams {
            strategy: kind,
            quantity: req.quantity,
            period_days: req.period,
        },
    )?;
    Ok(Json(report))
}
