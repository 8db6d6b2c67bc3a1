//! HTTP client for the webPOS processor API.
//!
//! One call per operation: no retries, no redirect following, no token
//! caching. A failed exchange surfaces immediately as an initiation
//! failure.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use super::types::{AccessTokenResponse, PaymentOrderRequest, PaymentOrderResponse, API_VERSION};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum WebposError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("token exchange response carried no access token")]
    MissingAccessToken,
}

/// Client for the processor's REST API.
#[derive(Clone)]
pub struct WebposClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl WebposClient {
    pub fn new(base_url: String, client_id: String, client_secret: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();

        WebposClient {
            client,
            base_url,
            client_id,
            client_secret,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange client credentials for a short-lived bearer token.
    /// Fetched fresh for every payment initiation.
    pub async fn access_token(&self) -> Result<String, WebposError> {
        let url = format!("{}/token", self.base_url.trim_end_matches('/'));
        let credentials = BASE64.encode(format!("{}:{}", self.client_id, self.client_secret));

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Basic {}", credentials))
            .header(ACCEPT, "application/json")
            .header("X-Api-Version", API_VERSION)
            .json(&json!({
                "grant_type": "client_credentials",
                "scope": "*",
            }))
            .send()
            .await?;

        let body = response.json::<AccessTokenResponse>().await?;
        body.access_token.ok_or(WebposError::MissingAccessToken)
    }

    /// Create a payment order for the given request. The raw decoded
    /// response is returned; the caller classifies redirect/message/other.
    pub async fn create_payment_order(
        &self,
        access_token: &str,
        request: &PaymentOrderRequest,
    ) -> Result<PaymentOrderResponse, WebposError> {
        let url = format!("{}/payment-order", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(ACCEPT, "application/json")
            .header("X-Api-Version", API_VERSION)
            .json(request)
            .send()
            .await?;

        Ok(response.json::<PaymentOrderResponse>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> WebposClient {
        WebposClient::new(
            server.url(),
            "pk_test".to_string(),
            "sk_test".to_string(),
        )
    }

    fn order_request() -> PaymentOrderRequest {
        PaymentOrderRequest {
            amount: "25.00".to_string(),
            cancel_url: "https://shop.example/checkout".to_string(),
            callback_url: "https://shop.example/callback?token=t".to_string(),
            continue_url: "https://shop.example/order/42/received?payment_id=".to_string(),
            details: "details".to_string(),
            reference: "42".to_string(),
            required_confirmations: 3,
        }
    }

    #[tokio::test]
    async fn test_access_token_uses_basic_auth_and_api_version() {
        let mut server = mockito::Server::new_async().await;
        let expected = BASE64.encode("pk_test:sk_test");

        let mock = server
            .mock("POST", "/token")
            .match_header("authorization", format!("Basic {}", expected).as_str())
            .match_header("x-api-version", "v1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "tok_1"}"#)
            .create_async()
            .await;

        let token = client_for(&server).access_token().await.unwrap();
        assert_eq!(token, "tok_1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_access_token_missing_field_is_an_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "invalid_client"}"#)
            .create_async()
            .await;

        let result = client_for(&server).access_token().await;
        assert!(matches!(result, Err(WebposError::MissingAccessToken)));
    }

    #[tokio::test]
    async fn test_create_payment_order_sends_bearer_token() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/payment-order")
            .match_header("authorization", "Bearer tok_1")
            .match_header("x-api-version", "v1")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "amount": "25.00",
                "reference": "42",
                "required_confirmations": 3,
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"redirect_url": "https://pay.example/po_1", "uuid": "po_1"}"#)
            .create_async()
            .await;

        let response = client_for(&server)
            .create_payment_order("tok_1", &order_request())
            .await
            .unwrap();

        assert_eq!(
            response.redirect_url.as_deref(),
            Some("https://pay.example/po_1")
        );
        assert_eq!(response.uuid.as_deref(), Some("po_1"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_payment_order_decodes_processor_message() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/payment-order")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"message": "amount below minimum"}"#)
            .create_async()
            .await;

        let response = client_for(&server)
            .create_payment_order("tok_1", &order_request())
            .await
            .unwrap();

        assert!(response.redirect_url.is_none());
        assert_eq!(response.message.as_deref(), Some("amount below minimum"));
    }
}
