//! Postgres-backed implementation of the order gateway port.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;

use crate::db::queries::{self, OrderRow};
use crate::domain::{Order, OrderStatus};
use crate::ports::{GatewayError, OrderGateway};

pub struct PgOrderGateway {
    pool: PgPool,
}

impl PgOrderGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_err(err: sqlx::Error) -> GatewayError {
    GatewayError::Storage(err.to_string())
}

fn into_order(row: OrderRow) -> Result<Order, GatewayError> {
    let status = OrderStatus::parse(&row.status).ok_or_else(|| {
        GatewayError::Storage(format!("order {} has unknown status {:?}", row.id, row.status))
    })?;
    Ok(Order {
        id: row.id,
        total: row.total,
        status,
        transaction_id: row.transaction_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl OrderGateway for PgOrderGateway {
    async fn get_order(&self, id: i64) -> Result<Order, GatewayError> {
        let row = queries::get_order(&self.pool, id)
            .await
            .map_err(storage_err)?
            .ok_or(GatewayError::NotFound(id))?;
        into_order(row)
    }

    async fn get_total(&self, id: i64) -> Result<BigDecimal, GatewayError> {
        Ok(self.get_order(id).await?.total)
    }

    async fn set_transaction_id(&self, id: i64, value: &str) -> Result<(), GatewayError> {
        let affected = queries::set_transaction_id(&self.pool, id, value)
            .await
            .map_err(storage_err)?;
        if affected == 0 {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }

    async fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
        note: &str,
    ) -> Result<(), GatewayError> {
        let affected = queries::update_status(&self.pool, id, status.as_str(), note)
            .await
            .map_err(storage_err)?;
        if affected == 0 {
            return Err(GatewayError::NotFound(id));
        }
        Ok(())
    }

    async fn add_note(&self, id: i64, text: &str) -> Result<(), GatewayError> {
        queries::add_note(&self.pool, id, text).await.map_err(storage_err)
    }

    async fn get_meta(&self, order_id: i64, key: &str) -> Result<Option<String>, GatewayError> {
        queries::get_meta(&self.pool, order_id, key)
            .await
            .map_err(storage_err)
    }

    async fn set_meta(&self, order_id: i64, key: &str, value: &str) -> Result<(), GatewayError> {
        queries::upsert_meta(&self.pool, order_id, key, value)
            .await
            .map_err(storage_err)
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(storage_err)
    }
}
