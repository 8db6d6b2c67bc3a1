pub mod payments;
pub mod webhook;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, String>,
}

/// Display settings the host storefront renders at checkout. Pure
/// passthrough; nothing here affects payment behavior.
pub async fn gateway_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "enabled": state.settings.enabled,
        "title": state.settings.title,
        "description": state.settings.description,
        "show_logo": state.settings.show_logo,
        "sandbox": state.settings.sandbox,
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let order_store = match state.orders.ping().await {
        Ok(()) => "healthy",
        Err(_) => "unhealthy",
    };

    let status = if order_store == "healthy" {
        "healthy"
    } else {
        "unhealthy"
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        dependencies: HashMap::from([("order_store".to_string(), order_store.to_string())]),
    };

    let status_code = match status {
        "healthy" => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}
