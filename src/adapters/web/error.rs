//! HTTP error responses for the web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::error::VolguardError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<VolguardError> for ApiError {
    fn from(err: VolguardError) -> Self {
        let status = match &err {
            VolguardError::UnknownStrategy { .. }
            | VolguardError::NoLegs { .. }
            | VolguardError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            VolguardError::InsufficientData { .. }
            | VolguardError::NoExpiry { .. }
            | VolguardError::EmptyChain { .. }
            | VolguardError::GarchFit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            VolguardError::FundsWindowClosed => StatusCode::SERVICE_UNAVAILABLE,
            VolguardError::BrokerHttp { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            VolguardError::BrokerTransport { .. } => StatusCode::BAD_GATEWAY,
            VolguardError::Database { .. }
            | VolguardError::DatabaseQuery { .. }
            | VolguardError::History { .. }
            | VolguardError::ConfigParse { .. }
            | VolguardError::ConfigMissing { .. }
            | VolguardError::ConfigInvalid { .. }
            | VolguardError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
