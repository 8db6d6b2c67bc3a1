use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Result};

/// Raw row shape of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub total: BigDecimal,
    pub status: String,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn get_order(pool: &PgPool, id: i64) -> Result<Option<OrderRow>> {
    sqlx::query_as::<_, OrderRow>(
        "SELECT id, total, status, transaction_id, created_at, updated_at
         FROM orders WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn set_transaction_id(pool: &PgPool, id: i64, value: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE orders SET transaction_id = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Status move plus note append in one transaction; the per-order
/// atomicity the reconciliation engine depends on.
pub async fn update_status(pool: &PgPool, id: i64, status: &str, note: &str) -> Result<u64> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO order_notes (order_id, note) VALUES ($1, $2)")
        .bind(id)
        .bind(note)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}

pub async fn add_note(pool: &PgPool, id: i64, note: &str) -> Result<()> {
    sqlx::query("INSERT INTO order_notes (order_id, note) VALUES ($1, $2)")
        .bind(id)
        .bind(note)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn get_meta(pool: &PgPool, order_id: i64, key: &str) -> Result<Option<String>> {
    sqlx::query_scalar::<_, String>(
        "SELECT meta_value FROM order_meta WHERE order_id = $1 AND meta_key = $2",
    )
    .bind(order_id)
    .bind(key)
    .fetch_optional(pool)
    .await
}

pub async fn upsert_meta(pool: &PgPool, order_id: i64, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO order_meta (order_id, meta_key, meta_value)
         VALUES ($1, $2, $3)
         ON CONFLICT (order_id, meta_key)
         DO UPDATE SET meta_value = EXCLUDED.meta_value",
    )
    .bind(order_id)
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}
