//! Bearer-token gate for the API.
//!
//! When `[auth] api_token_hash` is configured (an argon2 hash produced by
//! `volguard hash-token`), every API route requires a matching
//! `Authorization: Bearer <token>` header. Without the config key the API is
//! open, which suits single-user local deployments.

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use super::{AppState, error::ApiError};

pub async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected_hash) = state.config.get_string("auth", "api_token_hash") else {
        return Ok(next.run(request).await);
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Err(ApiError::unauthorized("missing bearer token"));
    };

    let parsed = PasswordHash::new(&expected_hash)
        .map_err(|_| ApiError::internal("invalid [auth] api_token_hash in config"))?;

    Argon2::default()
        .verify_password(token.as_bytes(), &parsed)
        .map_err(|_| ApiError::unauthorized("invalid token"))?;

    Ok(next.run(request).await)
}
