//! Brokerage access port trait.
//!
//! The access token is passed per call: clients of the API authenticate with
//! the broker themselves and hand us a session token per request.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::chain::OptionChain;
use crate::domain::error::VolguardError;
use crate::domain::strategy::{OrderAction, OrderType, StrategyLeg};

/// An order to submit to the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub instrument_key: String,
    pub quantity: i64,
    pub action: OrderAction,
    #[serde(default = "default_order_type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub trigger_price: f64,
    #[serde(default)]
    pub disclosed_quantity: i64,
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Margin needed for this order; when set, placement is refused if the
    /// account's available margin is below it.
    #[serde(default)]
    pub margin_required: Option<f64>,
}

fn default_order_type() -> OrderType {
    OrderType::Market
}

fn default_tag() -> String {
    "volguard".to_string()
}

impl From<&StrategyLeg> for OrderRequest {
    fn from(leg: &StrategyLeg) -> Self {
        Self {
            instrument_key: leg.instrument_key.clone(),
            quantity: leg.quantity,
            action: leg.action,
            order_type: leg.order_type,
            price: 0.0,
            trigger_price: 0.0,
            disclosed_quantity: 0,
            tag: default_tag(),
            margin_required: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MarginSegment {
    #[serde(default)]
    pub available_margin: f64,
    #[serde(default)]
    pub used_margin: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FundsAndMargin {
    #[serde(default)]
    pub equity: MarginSegment,
    #[serde(default)]
    pub commodity: MarginSegment,
}

#[async_trait]
pub trait BrokerPort {
    /// Available contract expiries for an underlying, ascending.
    async fn expiries(
        &self,
        access_token: &str,
        instrument_key: &str,
    ) -> Result<Vec<NaiveDate>, VolguardError>;

    async fn option_chain(
        &self,
        access_token: &str,
        instrument_key: &str,
        expiry: NaiveDate,
    ) -> Result<OptionChain, VolguardError>;

    async fn place_order(
        &self,
        access_token: &str,
        order: &OrderRequest,
    ) -> Result<OrderReceipt, VolguardError>;

    /// Realized premium flow for an order's fills.
    async fn order_pnl(&self, access_token: &str, order_id: &str) -> Result<f64, VolguardError>;

    async fn funds_and_margin(&self, access_token: &str)
    -> Result<FundsAndMargin, VolguardError>;

    async fn profile(&self, access_token: &str) -> Result<serde_json::Value, VolguardError>;

    async fn positions(&self, access_token: &str) -> Result<serde_json::Value, VolguardError>;

    async fn holdings(&self, access_token: &str) -> Result<serde_json::Value, VolguardError>;
}
