//! Ports consumed and exposed by the core.
//!
//! `OrderGateway` is the seam to the host platform's order storage; the
//! core holds it as `Arc<dyn OrderGateway>` and never touches rows
//! directly. `PaymentGateway` is the capability contract the host
//! integration layer adapts to whatever the storefront expects.

use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::domain::{Order, OrderStatus};
use crate::webpos::WebposError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("order {0} not found")]
    NotFound(i64),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Host-platform order storage.
///
/// `update_status` appends the note and moves the status in one atomic
/// per-order operation; callback reconciliation correctness relies on
/// that. Metadata is order-scoped key/value side storage (the callback
/// token lives under the `token` key).
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn get_order(&self, id: i64) -> Result<Order, GatewayError>;

    async fn get_total(&self, id: i64) -> Result<BigDecimal, GatewayError>;

    async fn set_transaction_id(&self, id: i64, value: &str) -> Result<(), GatewayError>;

    async fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
        note: &str,
    ) -> Result<(), GatewayError>;

    async fn add_note(&self, id: i64, text: &str) -> Result<(), GatewayError>;

    async fn get_meta(&self, order_id: i64, key: &str) -> Result<Option<String>, GatewayError>;

    async fn set_meta(&self, order_id: i64, key: &str, value: &str) -> Result<(), GatewayError>;

    /// Dependency liveness, for the health endpoint.
    async fn ping(&self) -> Result<(), GatewayError>;
}

/// Successful checkout initiation: where to send the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRedirect {
    pub redirect_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum InitiationError {
    /// The processor refused the payment order and said why; the message
    /// is safe to surface to the buyer.
    #[error("payment declined by processor: {0}")]
    Declined(String),
    /// Response carried neither a redirect nor a message.
    #[error("payment processor returned an unusable response")]
    MalformedResponse,
    #[error(transparent)]
    Upstream(#[from] WebposError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Capability contract of the payment gateway toward the host storefront.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Whether checkout should offer this gateway for the given order.
    fn is_available(&self, order: &Order) -> bool;

    /// Create a processor payment order and return the buyer redirect.
    async fn create_payment(&self, order_id: i64) -> Result<CheckoutRedirect, InitiationError>;

    /// Processor checkout view for an order with a bound transaction id.
    fn transaction_url(&self, order: &Order) -> Option<String>;
}
