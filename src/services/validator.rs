//! Inbound callback authentication.
//!
//! Every payload is logged verbatim before any check runs, so rejected
//! deliveries can be diagnosed and replayed offline. All failures
//! collapse into one uniform rejection: the caller learns nothing about
//! which check failed.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::Order;
use crate::ports::OrderGateway;
use crate::services::token_store::TOKEN_META_KEY;
use crate::webpos::types::{WebhookEvent, PAYMENT_ORDER_OBJECT};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
    /// Uniform rejection; the specific cause is only logged server-side.
    #[error("callback rejected")]
    Rejected,
}

pub struct CallbackValidator {
    orders: Arc<dyn OrderGateway>,
}

impl CallbackValidator {
    pub fn new(orders: Arc<dyn OrderGateway>) -> Self {
        Self { orders }
    }

    /// Authenticate and parse a raw callback delivery.
    ///
    /// Checks, in order: JSON shape with a recognized event kind,
    /// `object_type`, reference resolving to a known order, and exact
    /// equality of the stored token with the query-string token.
    pub async fn validate(
        &self,
        raw_body: &str,
        query_token: &str,
    ) -> Result<(Order, WebhookEvent), CallbackError> {
        info!(payload = %raw_body, "payment callback received");

        let event: WebhookEvent = match serde_json::from_str(raw_body) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "callback rejected: unparseable payload");
                return Err(CallbackError::Rejected);
            }
        };

        if event.object_type != PAYMENT_ORDER_OBJECT {
            warn!(object_type = %event.object_type, "callback rejected: unexpected object type");
            return Err(CallbackError::Rejected);
        }

        let order_id: i64 = match event.object.reference.parse() {
            Ok(id) => id,
            Err(_) => {
                warn!(reference = %event.object.reference, "callback rejected: malformed reference");
                return Err(CallbackError::Rejected);
            }
        };

        let order = match self.orders.get_order(order_id).await {
            Ok(order) => order,
            Err(_) => {
                warn!(order_id, "callback rejected: unknown reference");
                return Err(CallbackError::Rejected);
            }
        };

        let stored = match self.orders.get_meta(order_id, TOKEN_META_KEY).await {
            Ok(Some(token)) => token,
            _ => {
                warn!(order_id, "callback rejected: no token on record");
                return Err(CallbackError::Rejected);
            }
        };

        if stored != query_token {
            warn!(order_id, "callback rejected: token mismatch");
            return Err(CallbackError::Rejected);
        }

        Ok((order, event))
    }
}
