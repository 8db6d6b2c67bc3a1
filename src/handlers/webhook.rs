//! Inbound webhook endpoint.
//!
//! One route, method-agnostic, authenticated purely by the per-order
//! token in the query string. Success answers `{"code":200}`; any
//! validation or reconciliation failure answers a uniform 500 so the
//! processor redelivers and probing callers learn nothing.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::services::{CallbackValidator, ReconciliationEngine};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub token: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    body: String,
) -> Response {
    let validator = CallbackValidator::new(state.orders.clone());
    let engine = ReconciliationEngine::new(state.orders.clone());
    let token = query.token.unwrap_or_default();

    let accepted = match validator.validate(&body, &token).await {
        Ok((order, event)) => engine.apply(&order, &event).await.is_ok(),
        Err(_) => false,
    };

    if accepted {
        (StatusCode::OK, Json(json!({ "code": 200 }))).into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Payment callback failure").into_response()
    }
}
