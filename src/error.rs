use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

use crate::ports::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Payment error: {0}")]
    PaymentDeclined(String),
    #[error("Payment error")]
    PaymentFailed,
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(id) => AppError::NotFound(format!("Order {} not found", id)),
            GatewayError::Storage(msg) => AppError::Storage(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::PaymentDeclined(msg) => {
                (StatusCode::BAD_GATEWAY, format!("Payment error: {}", msg))
            }
            AppError::PaymentFailed => (StatusCode::BAD_GATEWAY, "Payment error".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
