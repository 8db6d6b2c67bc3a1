//! Per-order callback verification tokens.
//!
//! A token is minted at payment-initiation time, embedded in the
//! callback URL, and stored in the order's metadata. It is the sole
//! shared secret authenticating every later callback for that order.

use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::ports::{GatewayError, OrderGateway};

/// Metadata key the token digest is stored under.
pub const TOKEN_META_KEY: &str = "token";

const TOKEN_LENGTH: usize = 15;
const TOKEN_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub struct CallbackTokenStore {
    orders: Arc<dyn OrderGateway>,
}

impl CallbackTokenStore {
    pub fn new(orders: Arc<dyn OrderGateway>) -> Self {
        Self { orders }
    }

    /// Mint a fresh token for the order, overwriting any prior one, and
    /// return the digest that goes into the callback URL. Only the latest
    /// issued token validates.
    pub async fn issue(&self, order_id: i64) -> Result<String, GatewayError> {
        let token = mint_token();
        self.orders
            .set_meta(order_id, TOKEN_META_KEY, &token)
            .await?;
        Ok(token)
    }

    pub async fn stored(&self, order_id: i64) -> Result<Option<String>, GatewayError> {
        self.orders.get_meta(order_id, TOKEN_META_KEY).await
    }
}

/// Random alphanumeric seed stretched through SHA-256. The digest itself
/// is the secret compared on each callback, not the seed.
fn mint_token() -> String {
    let mut rng = rand::thread_rng();
    let seed: String = (0..TOKEN_LENGTH)
        .map(|_| TOKEN_CHARSET[rng.gen_range(0..TOKEN_CHARSET.len())] as char)
        .collect();
    hex::encode(Sha256::digest(seed.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryOrderGateway;
    use crate::domain::Order;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    #[test]
    fn test_mint_token_is_a_hex_digest() {
        let token = mint_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_mint_token_varies() {
        assert_ne!(mint_token(), mint_token());
    }

    #[tokio::test]
    async fn test_issue_overwrites_previous_token() {
        let orders = Arc::new(MemoryOrderGateway::new());
        orders
            .insert_order(Order::new(42, BigDecimal::from_str("25.00").unwrap()))
            .await;
        let store = CallbackTokenStore::new(orders.clone());

        let first = store.issue(42).await.unwrap();
        let second = store.issue(42).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.stored(42).await.unwrap(), Some(second));
    }
}
