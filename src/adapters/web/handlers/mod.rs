//! Request handlers, grouped by API area.

pub mod analytics;
pub mod market_data;
pub mod strategy;
pub mod trade;
pub mod user;
pub mod volatility;

use serde::Deserialize;

/// Body for endpoints that only need the broker session token.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub access_token: String,
}
