//! In-memory order gateway for tests and local experiments.
//! Mirrors the host-store semantics the core relies on: per-order
//! atomic status moves with note append.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::domain::{Order, OrderStatus};
use crate::ports::{GatewayError, OrderGateway};

#[derive(Default)]
struct Inner {
    orders: HashMap<i64, Order>,
    notes: HashMap<i64, Vec<String>>,
    meta: HashMap<(i64, String), String>,
}

#[derive(Default)]
pub struct MemoryOrderGateway {
    inner: Mutex<Inner>,
}

impl MemoryOrderGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_order(&self, order: Order) {
        self.inner.lock().await.orders.insert(order.id, order);
    }

    pub async fn order(&self, id: i64) -> Option<Order> {
        self.inner.lock().await.orders.get(&id).cloned()
    }

    pub async fn notes(&self, id: i64) -> Vec<String> {
        self.inner
            .lock()
            .await
            .notes
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn meta(&self, order_id: i64, key: &str) -> Option<String> {
        self.inner
            .lock()
            .await
            .meta
            .get(&(order_id, key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl OrderGateway for MemoryOrderGateway {
    async fn get_order(&self, id: i64) -> Result<Order, GatewayError> {
        self.inner
            .lock()
            .await
            .orders
            .get(&id)
            .cloned()
            .ok_or(GatewayError::NotFound(id))
    }

    async fn get_total(&self, id: i64) -> Result<BigDecimal, GatewayError> {
        Ok(self.get_order(id).await?.total)
    }

    async fn set_transaction_id(&self, id: i64, value: &str) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().await;
        let order = inner.orders.get_mut(&id).ok_or(GatewayError::NotFound(id))?;
        order.transaction_id = Some(value.to_string());
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
        note: &str,
    ) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().await;
        let order = inner.orders.get_mut(&id).ok_or(GatewayError::NotFound(id))?;
        order.status = status;
        order.updated_at = Utc::now();
        inner.notes.entry(id).or_default().push(note.to_string());
        Ok(())
    }

    async fn add_note(&self, id: i64, text: &str) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().await;
        if !inner.orders.contains_key(&id) {
            return Err(GatewayError::NotFound(id));
        }
        inner.notes.entry(id).or_default().push(text.to_string());
        Ok(())
    }

    async fn get_meta(&self, order_id: i64, key: &str) -> Result<Option<String>, GatewayError> {
        Ok(self
            .inner
            .lock()
            .await
            .meta
            .get(&(order_id, key.to_string()))
            .cloned())
    }

    async fn set_meta(&self, order_id: i64, key: &str, value: &str) -> Result<(), GatewayError> {
        self.inner
            .lock()
            .await
            .meta
            .insert((order_id, key.to_string()), value.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        Ok(())
    }
}
