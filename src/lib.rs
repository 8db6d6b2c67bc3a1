pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod services;
pub mod webpos;

use axum::{
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{Config, GatewaySettings};
use crate::ports::{OrderGateway, PaymentGateway};
use crate::services::WebposGateway;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderGateway>,
    pub payments: Arc<dyn PaymentGateway>,
    pub settings: GatewaySettings,
    pub start_time: Instant,
}

impl AppState {
    /// Wires the concrete gateway once at startup; no component reaches
    /// for global state after this.
    pub fn new(config: &Config, orders: Arc<dyn OrderGateway>) -> Result<Self, url::ParseError> {
        let payments: Arc<dyn PaymentGateway> =
            Arc::new(WebposGateway::new(config, orders.clone())?);
        Ok(Self {
            orders,
            payments,
            settings: config.gateway.clone(),
            start_time: Instant::now(),
        })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/gateway", get(handlers::gateway_info))
        .route("/callback", any(handlers::webhook::callback))
        .route("/payments/:order_id", post(handlers::payments::initiate_payment))
        .route(
            "/payments/:order_id/transaction-url",
            get(handlers::payments::transaction_url),
        )
        .layer(axum::middleware::from_fn(middleware::request_logger))
        .with_state(state)
}
