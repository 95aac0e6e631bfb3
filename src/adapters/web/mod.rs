//! Web server adapter.
//!
//! Axum JSON API over the domain: market data, volatility forecasts,
//! strategy suggestion/execution, risk analytics, trade execution and
//! account data.

mod auth;
mod error;
pub mod handlers;

pub use error::ApiError;

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::domain::chain_metrics::OiStore;
use crate::ports::broker_port::BrokerPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::history_port::HistoryPort;
use crate::ports::trade_store_port::TradeStorePort;

pub struct AppState {
    pub broker: Arc<dyn BrokerPort + Send + Sync>,
    pub history: Arc<dyn HistoryPort + Send + Sync>,
    pub trade_store: Arc<dyn TradeStorePort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
    /// Previous-snapshot OI, shared across option-chain requests.
    pub oi_store: Mutex<OiStore>,
}

impl AppState {
    pub fn new(
        broker: Arc<dyn BrokerPort + Send + Sync>,
        history: Arc<dyn HistoryPort + Send + Sync>,
        trade_store: Arc<dyn TradeStorePort + Send + Sync>,
        config: Arc<dyn ConfigPort + Send + Sync>,
    ) -> Self {
        Self {
            broker,
            history,
            trade_store,
            config,
            oi_store: Mutex::new(OiStore::new()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let api = Router::new()
        .route(
            "/market-data/option-chain",
            post(handlers::market_data::option_chain),
        )
        .route("/volatility/forecast", post(handlers::volatility::forecast))
        .route("/volatility/garch", get(handlers::volatility::garch))
        .route(
            "/volatility/historical",
            get(handlers::volatility::historical),
        )
        .route("/strategy/suggest", post(handlers::strategy::suggest))
        .route("/strategy/execute", post(handlers::strategy::execute))
        .route("/strategy/backtest", post(handlers::strategy::backtest))
        .route("/analytics/trades", post(handlers::analytics::log_trade))
        .route(
            "/analytics/performance",
            get(handlers::analytics::performance),
        )
        .route("/analytics/risk-check", post(handlers::analytics::risk_check))
        .route(
            "/analytics/regime-score",
            post(handlers::analytics::regime_score),
        )
        .route("/analytics/discipline", get(handlers::analytics::discipline))
        .route("/trade/place-order", post(handlers::trade::place_order))
        .route("/trade/pnl", post(handlers::trade::order_pnl))
        .route("/trade/funds-margin", post(handlers::trade::funds_margin))
        .route("/user/details", post(handlers::user::details))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_token,
        ));

    Router::new()
        .route("/", get(health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "message": "volguard backend is running",
    }))
}
