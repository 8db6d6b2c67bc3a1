//! Checkout-side payment gateway: mints the callback token, creates the
//! processor payment order and classifies the response.

use bigdecimal::{BigDecimal, Zero};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

use crate::config::{Config, GatewaySettings};
use crate::domain::Order;
use crate::ports::{CheckoutRedirect, InitiationError, OrderGateway, PaymentGateway};
use crate::services::token_store::CallbackTokenStore;
use crate::webpos::types::PaymentOrderRequest;
use crate::webpos::WebposClient;
use async_trait::async_trait;

pub struct WebposGateway {
    settings: GatewaySettings,
    client: WebposClient,
    orders: Arc<dyn OrderGateway>,
    tokens: CallbackTokenStore,
    store_url: Url,
    public_url: Url,
}

impl WebposGateway {
    pub fn new(config: &Config, orders: Arc<dyn OrderGateway>) -> Result<Self, url::ParseError> {
        let settings = config.gateway.clone();
        let client = WebposClient::new(
            settings.api_base().to_string(),
            settings.client_id.clone(),
            settings.client_secret.clone(),
        );

        Ok(Self {
            client,
            tokens: CallbackTokenStore::new(orders.clone()),
            orders,
            settings,
            store_url: Url::parse(&config.store_url)?,
            public_url: Url::parse(&config.public_url)?,
        })
    }

    fn cancel_url(&self) -> String {
        let mut url = self.store_url.clone();
        url.set_path("/checkout");
        url.to_string()
    }

    /// Callback delivery target with the freshly minted token in the
    /// query string.
    fn callback_url(&self, token: &str) -> String {
        let mut url = self.public_url.clone();
        url.set_path("/callback");
        url.query_pairs_mut().clear().append_pair("token", token);
        url.to_string()
    }

    /// Where the processor sends the buyer after paying; it appends its
    /// own payment_id query parameter.
    fn continue_url(&self, order_id: i64) -> String {
        let mut url = self.store_url.clone();
        url.set_path(&format!("/order/{}/received", order_id));
        url.to_string()
    }
}

#[async_trait]
impl PaymentGateway for WebposGateway {
    fn is_available(&self, order: &Order) -> bool {
        self.settings.enabled && order.total > BigDecimal::zero()
    }

    async fn create_payment(&self, order_id: i64) -> Result<CheckoutRedirect, InitiationError> {
        let order = self.orders.get_order(order_id).await?;
        let amount = format_amount(&order.total);
        let token = self.tokens.issue(order.id).await?;

        let request = PaymentOrderRequest {
            amount,
            cancel_url: self.cancel_url(),
            callback_url: self.callback_url(&token),
            continue_url: self.continue_url(order.id),
            details: "details".to_string(),
            reference: order.id.to_string(),
            required_confirmations: self.settings.confirmations.as_u32(),
        };

        let access_token = self.client.access_token().await?;
        let response = self.client.create_payment_order(&access_token, &request).await?;

        if let Some(redirect_url) = response.redirect_url {
            info!(order_id, uuid = ?response.uuid, "payment order created");
            return Ok(CheckoutRedirect { redirect_url });
        }

        if let Some(message) = response.message {
            warn!(order_id, message = %message, "payment order declined by processor");
            return Err(InitiationError::Declined(message));
        }

        error!(order_id, "payment order response carried neither redirect_url nor message");
        Err(InitiationError::MalformedResponse)
    }

    fn transaction_url(&self, order: &Order) -> Option<String> {
        order
            .transaction_id
            .as_ref()
            .map(|uuid| self.settings.transaction_url(uuid))
    }
}

/// Order totals go on the wire as fixed 2-decimal strings.
pub fn format_amount(total: &BigDecimal) -> String {
    total.with_scale(2).to_string()
}
