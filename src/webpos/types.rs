//! Wire types for the webPOS processor API and its webhook callbacks.

use bigdecimal::BigDecimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Value of the `X-Api-Version` header on every processor call.
pub const API_VERSION: &str = "v1";

/// The only `object_type` this service consumes.
pub const PAYMENT_ORDER_OBJECT: &str = "payment_order";

/// Crypto amounts on the wire are integer satoshis.
pub const SATOSHIS_PER_BTC: u64 = 100_000_000;

/// Body of `POST /payment-order`. Built once per checkout attempt.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOrderRequest {
    /// Fiat amount as a fixed 2-decimal string.
    pub amount: String,
    pub cancel_url: String,
    pub callback_url: String,
    pub continue_url: String,
    pub details: String,
    /// Merchant order id, echoed back in every callback.
    pub reference: String,
    pub required_confirmations: u32,
}

/// Decoded `POST /payment-order` response. Exactly one of `redirect_url`
/// or `message` is expected; both absent is an upstream anomaly.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentOrderResponse {
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Recognized webhook event kinds. Anything else fails deserialization
/// and is rejected at validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "payment.completed")]
    Completed,
    #[serde(rename = "payment.dispute.start")]
    DisputeStart,
    #[serde(rename = "payment.overpaid")]
    Overpaid,
    #[serde(rename = "payment.cancelled")]
    Cancelled,
    #[serde(rename = "payment.dispute.end")]
    DisputeEnd,
    #[serde(rename = "payment.expired")]
    Expired,
    #[serde(rename = "payment.chargeback")]
    Chargeback,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "payment.completed",
            Self::DisputeStart => "payment.dispute.start",
            Self::Overpaid => "payment.overpaid",
            Self::Cancelled => "payment.cancelled",
            Self::DisputeEnd => "payment.dispute.end",
            Self::Expired => "payment.expired",
            Self::Chargeback => "payment.chargeback",
        }
    }
}

/// A webhook delivery. Transient: validated, reconciled, never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: EventKind,
    pub object_type: String,
    pub object: PaymentOrderObject,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentOrderObject {
    pub reference: String,
    pub uuid: String,
    #[serde(default)]
    pub state: PaymentState,
    /// Requested amount in satoshis.
    #[serde(default)]
    pub btc_amount: Option<u64>,
    #[serde(default)]
    pub currency: Option<Currency>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentState {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub paid: Option<PaidAmounts>,
    #[serde(default)]
    pub unpaid: Option<UnpaidAmounts>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaidAmounts {
    #[serde(default, deserialize_with = "fiat_amount")]
    pub fiat: Option<BigDecimal>,
    /// Paid amount in satoshis.
    #[serde(default)]
    pub crypto: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnpaidAmounts {
    #[serde(default, deserialize_with = "fiat_amount")]
    pub fiat: Option<BigDecimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub name: Option<String>,
}

/// Fiat amounts arrive as either JSON strings or numbers depending on the
/// processor version.
fn fiat_amount<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse().map(Some).map_err(de::Error::custom),
        Some(Value::Number(n)) => n.to_string().parse().map(Some).map_err(de::Error::custom),
        Some(other) => Err(de::Error::custom(format!(
            "fiat amount must be a string or number, got {}",
            other
        ))),
    }
}
