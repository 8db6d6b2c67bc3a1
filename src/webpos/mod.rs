pub mod client;
pub mod types;

pub use client::{WebposClient, WebposError};
pub use types::{
    AccessTokenResponse, EventKind, PaymentOrderRequest, PaymentOrderResponse, WebhookEvent,
};
