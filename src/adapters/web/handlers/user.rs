//! Account details endpoint.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::warn;

use crate::adapters::web::{ApiError, AppState};
use crate::domain::error::VolguardError;
use crate::ports::broker_port::FundsAndMargin;

use super::TokenRequest;

#[derive(Debug, Serialize)]
pub struct UserDetailsResponse {
    pub profile: serde_json::Value,
    /// None during the broker's funds-API maintenance window.
    pub funds: Option<FundsAndMargin>,
    pub positions: serde_json::Value,
    pub holdings: serde_json::Value,
}

/// Profile, funds, positions and holdings in one call.
pub async fn details(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<UserDetailsResponse>, ApiError> {
    let token = req.access_token.as_str();

    let (profile, funds, positions, holdings) = tokio::join!(
        state.broker.profile(token),
        state.broker.funds_and_margin(token),
        state.broker.positions(token),
        state.broker.holdings(token),
    );

    let funds = match funds {
        Ok(f) => Some(f),
        Err(VolguardError::FundsWindowClosed) => {
            warn!("funds API in maintenance window, omitting from details");
            None
        }
        Err(err) => return Err(err.into()),
    };

    Ok(Json(UserDetailsResponse {
        profile: profile?,
        funds,
        positions: positions?,
        holdings: holdings?,
    }))
}
