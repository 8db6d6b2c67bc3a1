//! Order domain entity.
//! Framework-agnostic view of a host-platform order; this service reads
//! totals and transitions status, it never creates or deletes orders.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};

/// Lifecycle states of an order as the host platform models them. The
/// reconciliation engine only ever moves `Pending` forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Refunded,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "refunded" => Some(Self::Refunded),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Domain entity representing an order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: i64,
    pub total: BigDecimal,
    pub status: OrderStatus,
    /// Processor-side payment order uuid, bound once from the first
    /// trusted callback.
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: i64, total: BigDecimal) -> Self {
        let now = Utc::now();
        Self {
            id,
            total,
            status: OrderStatus::Pending,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}
