//! Reconciliation engine: maps validated callback events onto monotonic,
//! idempotent order-status transitions.
//!
//! Transitions are `pending -> processing` (paid) and `pending ->
//! cancelled` (expired/cancelled), never backwards. Replays of an
//! already-applied event succeed without side effects; conflicting
//! events are rejected so the processor redelivers them for a human to
//! notice.

use bigdecimal::Zero;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::{Order, OrderStatus};
use crate::ports::{GatewayError, OrderGateway};
use crate::webpos::types::{EventKind, PaymentOrderObject, WebhookEvent, SATOSHIS_PER_BTC};

#[derive(Debug, Error)]
pub enum EngineError {
    /// Business-rule rejection; the HTTP boundary answers 500 and the
    /// processor redelivers later.
    #[error("event rejected: {0}")]
    Rejected(&'static str),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Transitioned(OrderStatus),
    /// Replay of an event whose transition was already applied.
    AlreadyApplied,
    /// Valid event with no transition attached (disputes, chargebacks,
    /// overpayment without excess).
    Acknowledged,
    OverpaymentNoted,
}

pub struct ReconciliationEngine {
    orders: Arc<dyn OrderGateway>,
}

impl ReconciliationEngine {
    pub fn new(orders: Arc<dyn OrderGateway>) -> Self {
        Self { orders }
    }

    /// Evaluate one validated event against the order it references.
    pub async fn apply(
        &self,
        order: &Order,
        event: &WebhookEvent,
    ) -> Result<ReconcileOutcome, EngineError> {
        let object = &event.object;

        // The first trusted callback binds the processor uuid; every
        // later one is checked against the persisted value.
        let transaction_id = match &order.transaction_id {
            Some(id) => id.clone(),
            None => {
                self.orders
                    .set_transaction_id(order.id, &object.uuid)
                    .await?;
                info!(order_id = order.id, uuid = %object.uuid, "payment order uuid bound to order");
                object.uuid.clone()
            }
        };

        let outcome = match event.event {
            EventKind::Completed => self.completed(order, object, &transaction_id).await,
            EventKind::Expired | EventKind::Cancelled => {
                self.cancelled(order, object, &transaction_id).await
            }
            EventKind::Overpaid => self.overpaid(order, object).await,
            EventKind::DisputeStart | EventKind::DisputeEnd | EventKind::Chargeback => {
                self.acknowledge(order, event.event).await
            }
        };

        match &outcome {
            Ok(result) => info!(
                order_id = order.id,
                event = event.event.as_str(),
                outcome = ?result,
                "callback reconciled"
            ),
            Err(err) => warn!(
                order_id = order.id,
                event = event.event.as_str(),
                error = %err,
                "callback rejected by reconciliation"
            ),
        }
        outcome
    }

    async fn completed(
        &self,
        order: &Order,
        object: &PaymentOrderObject,
        transaction_id: &str,
    ) -> Result<ReconcileOutcome, EngineError> {
        if object.uuid != transaction_id {
            return Err(EngineError::Rejected("uuid does not match bound transaction id"));
        }

        if let Some(unpaid) = object.state.unpaid.as_ref().and_then(|u| u.fiat.as_ref()) {
            if !unpaid.is_zero() {
                return Err(EngineError::Rejected("unpaid balance remains"));
            }
        }

        let paid = object
            .state
            .paid
            .as_ref()
            .and_then(|p| p.fiat.as_ref())
            .ok_or(EngineError::Rejected("paid amount missing"))?;
        if *paid != order.total {
            return Err(EngineError::Rejected("paid amount does not equal order total"));
        }

        match order.status {
            OrderStatus::Processing => Ok(ReconcileOutcome::AlreadyApplied),
            OrderStatus::Pending => {
                self.orders
                    .update_status(order.id, OrderStatus::Processing, "Order paid")
                    .await?;
                Ok(ReconcileOutcome::Transitioned(OrderStatus::Processing))
            }
            _ => Err(EngineError::Rejected("order is not in a payable state")),
        }
    }

    async fn cancelled(
        &self,
        order: &Order,
        object: &PaymentOrderObject,
        transaction_id: &str,
    ) -> Result<ReconcileOutcome, EngineError> {
        if object.uuid != transaction_id {
            return Err(EngineError::Rejected("uuid does not match bound transaction id"));
        }

        match order.status {
            OrderStatus::Cancelled => Ok(ReconcileOutcome::AlreadyApplied),
            OrderStatus::Pending => {
                self.orders
                    .update_status(order.id, OrderStatus::Cancelled, "Payment order cancelled")
                    .await?;
                Ok(ReconcileOutcome::Transitioned(OrderStatus::Cancelled))
            }
            _ => Err(EngineError::Rejected("order already left the pending state")),
        }
    }

    /// Overpayment never changes status; it only leaves a note for the
    /// merchant when the buyer sent more satoshis than requested.
    async fn overpaid(
        &self,
        order: &Order,
        object: &PaymentOrderObject,
    ) -> Result<ReconcileOutcome, EngineError> {
        let state = &object.state;
        let paid_state = state.status.as_deref() == Some("paid");
        let fiat = state.paid.as_ref().and_then(|p| p.fiat.as_ref());
        let crypto = state.paid.as_ref().and_then(|p| p.crypto);

        if let (true, Some(fiat), Some(crypto), Some(btc_amount)) =
            (paid_state, fiat, crypto, object.btc_amount)
        {
            if crypto > btc_amount {
                let excess = format_btc(crypto - btc_amount);
                let requested = format_btc(btc_amount);
                let currency = object
                    .currency
                    .as_ref()
                    .and_then(|c| c.name.as_deref())
                    .unwrap_or("");
                let note = format!(
                    "Received \"{} BTC\" more than expected. Total of \"{} BTC\" or \"{} {}\".",
                    excess, requested, fiat, currency
                );
                self.orders.add_note(order.id, &note).await?;
                return Ok(ReconcileOutcome::OverpaymentNoted);
            }
        }

        Ok(ReconcileOutcome::Acknowledged)
    }

    /// Dispute and chargeback events carry no transition yet; they are
    /// acknowledged so the processor stops redelivering, and noted for
    /// the merchant.
    async fn acknowledge(
        &self,
        order: &Order,
        kind: EventKind,
    ) -> Result<ReconcileOutcome, EngineError> {
        self.orders
            .add_note(order.id, &format!("Payment processor reported {}.", kind.as_str()))
            .await?;
        Ok(ReconcileOutcome::Acknowledged)
    }
}

/// Satoshis rendered as whole coins with 8 decimal places.
fn format_btc(satoshis: u64) -> String {
    format!("{:.8}", satoshis as f64 / SATOSHIS_PER_BTC as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryOrderGateway;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn engine_with(orders: Arc<MemoryOrderGateway>) -> ReconciliationEngine {
        ReconciliationEngine::new(orders)
    }

    async fn pending_order(orders: &MemoryOrderGateway, id: i64, total: &str) -> Order {
        let order = Order::new(id, BigDecimal::from_str(total).unwrap());
        orders.insert_order(order.clone()).await;
        order
    }

    fn completed_event(uuid: &str, paid: &str, unpaid: &str) -> WebhookEvent {
        serde_json::from_str(&format!(
            r#"{{"event": "payment.completed", "object_type": "payment_order",
                 "object": {{"reference": "42", "uuid": "{}",
                             "state": {{"status": "paid",
                                        "paid": {{"fiat": "{}"}},
                                        "unpaid": {{"fiat": "{}"}}}}}}}}"#,
            uuid, paid, unpaid
        ))
        .unwrap()
    }

    fn overpaid_event(crypto: u64, btc_amount: u64) -> WebhookEvent {
        serde_json::from_str(&format!(
            r#"{{"event": "payment.overpaid", "object_type": "payment_order",
                 "object": {{"reference": "42", "uuid": "po_abc",
                             "state": {{"status": "paid",
                                        "paid": {{"fiat": "25.00", "crypto": {}}}}},
                             "btc_amount": {},
                             "currency": {{"name": "EUR"}}}}}}"#,
            crypto, btc_amount
        ))
        .unwrap()
    }

    fn cancel_event(kind: &str, uuid: &str) -> WebhookEvent {
        serde_json::from_str(&format!(
            r#"{{"event": "{}", "object_type": "payment_order",
                 "object": {{"reference": "42", "uuid": "{}"}}}}"#,
            kind, uuid
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_first_completed_binds_uuid_and_transitions() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        let outcome = engine
            .apply(&order, &completed_event("po_abc", "25.00", "0"))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Transitioned(OrderStatus::Processing));
        let stored = orders.order(42).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Processing);
        assert_eq!(stored.transaction_id.as_deref(), Some("po_abc"));
        assert_eq!(orders.notes(42).await, vec!["Order paid".to_string()]);
    }

    #[tokio::test]
    async fn test_completed_rejects_amount_off_by_a_cent() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        let result = engine
            .apply(&order, &completed_event("po_abc", "24.99", "0"))
            .await;

        assert!(matches!(result, Err(EngineError::Rejected(_))));
        assert_eq!(orders.order(42).await.unwrap().status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_completed_rejects_outstanding_unpaid_balance() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        let result = engine
            .apply(&order, &completed_event("po_abc", "25.00", "5.00"))
            .await;

        assert!(matches!(result, Err(EngineError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_completed_accepts_scale_variant_of_total() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        // 25.0 and 25.00 are the same amount.
        let outcome = engine
            .apply(&order, &completed_event("po_abc", "25.0", "0"))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Transitioned(OrderStatus::Processing));
    }

    #[tokio::test]
    async fn test_completed_replay_is_idempotent() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());
        let event = completed_event("po_abc", "25.00", "0");

        engine.apply(&order, &event).await.unwrap();
        let replayed = orders.order(42).await.unwrap();
        let outcome = engine.apply(&replayed, &event).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::AlreadyApplied);
        assert_eq!(orders.notes(42).await.len(), 1);
    }

    #[tokio::test]
    async fn test_completed_rejects_uuid_mismatch_after_binding() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let mut order = pending_order(&orders, 42, "25.00").await;
        order.transaction_id = Some("po_abc".to_string());
        orders.insert_order(order.clone()).await;
        let engine = engine_with(orders.clone());

        let result = engine
            .apply(&order, &completed_event("po_other", "25.00", "0"))
            .await;

        assert!(matches!(result, Err(EngineError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_expired_cancels_pending_order() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        let outcome = engine
            .apply(&order, &cancel_event("payment.expired", "po_abc"))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Transitioned(OrderStatus::Cancelled));
        assert_eq!(
            orders.notes(42).await,
            vec!["Payment order cancelled".to_string()]
        );
    }

    #[tokio::test]
    async fn test_cancel_conflicts_with_processing_order() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        engine
            .apply(&order, &completed_event("po_abc", "25.00", "0"))
            .await
            .unwrap();
        let processing = orders.order(42).await.unwrap();
        let result = engine
            .apply(&processing, &cancel_event("payment.cancelled", "po_abc"))
            .await;

        assert!(matches!(result, Err(EngineError::Rejected(_))));
        assert_eq!(orders.order(42).await.unwrap().status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_overpaid_notes_excess() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        let outcome = engine
            .apply(&order, &overpaid_event(150_000_000, 100_000_000))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::OverpaymentNoted);
        let notes = orders.notes(42).await;
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("0.50000000 BTC"));
        assert!(notes[0].contains("1.00000000 BTC"));
        assert!(notes[0].contains("25.00 EUR"));
    }

    #[tokio::test]
    async fn test_overpaid_without_excess_leaves_no_note() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        let outcome = engine
            .apply(&order, &overpaid_event(100_000_000, 100_000_000))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::Acknowledged);
        assert!(orders.notes(42).await.is_empty());
    }

    #[tokio::test]
    async fn test_dispute_is_acknowledged_without_transition() {
        let orders = Arc::new(MemoryOrderGateway::new());
        let order = pending_order(&orders, 42, "25.00").await;
        let engine = engine_with(orders.clone());

        let event: WebhookEvent = serde_json::from_str(
            r#"{"event": "payment.dispute.start", "object_type": "payment_order",
                "object": {"reference": "42", "uuid": "po_abc"}}"#,
        )
        .unwrap();

        let outcome = engine.apply(&order, &event).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::Acknowledged);
        assert_eq!(orders.order(42).await.unwrap().status, OrderStatus::Pending);
        assert_eq!(orders.notes(42).await.len(), 1);
    }

    #[test]
    fn test_format_btc_pads_to_eight_places() {
        assert_eq!(format_btc(50_000_000), "0.50000000");
        assert_eq!(format_btc(100_000_000), "1.00000000");
        assert_eq!(format_btc(1), "0.00000001");
    }
}
