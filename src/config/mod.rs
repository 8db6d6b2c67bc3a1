//! Environment-driven configuration.
//!
//! Two layers: service-level settings (port, database, URLs) and the
//! merchant-facing gateway settings that mirror what a store admin
//! configures (credentials, confirmation tier, sandbox mode).

use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

/// Production payment processor API.
pub const API_BASE_LIVE: &str = "https://api.webpos.chainside.net";
/// Sandbox payment processor API.
pub const API_BASE_SANDBOX: &str = "https://api.sandbox.webpos.chainside.net";

const TRANSACTION_VIEW_LIVE: &str = "https://checkout.chainside.net";
const TRANSACTION_VIEW_SANDBOX: &str = "https://sandbox.checkout.chainside.net";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    /// Buyer-facing store base URL (cancel/continue redirects).
    pub store_url: String,
    /// Public base URL of this service (callback delivery target).
    pub public_url: String,
    pub gateway: GatewaySettings,
}

/// Merchant settings for the payment gateway.
///
/// `title`, `description` and `show_logo` are display passthrough for the
/// host storefront; they carry no behavior here.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    pub enabled: bool,
    pub title: String,
    pub description: String,
    pub show_logo: bool,
    pub client_id: String,
    pub client_secret: String,
    pub confirmations: ConfirmationTier,
    pub sandbox: bool,
    /// Overrides the live/sandbox API base when set.
    pub api_url_override: Option<String>,
}

/// Number of blockchain confirmations the processor waits for before
/// settling. Higher tiers trade confirmation latency for double-spend
/// safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ConfirmationTier {
    One,
    Three,
    Six,
}

impl ConfirmationTier {
    pub fn from_env_value(value: &str) -> anyhow::Result<Self> {
        match value.trim() {
            "1" => Ok(Self::One),
            "3" => Ok(Self::Three),
            "6" => Ok(Self::Six),
            other => anyhow::bail!(
                "CONFIRMATION_REQUESTS must be one of 1, 3 or 6, got {:?}",
                other
            ),
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Three => 3,
            Self::Six => 6,
        }
    }
}

impl GatewaySettings {
    /// Processor API base for the configured environment.
    pub fn api_base(&self) -> &str {
        if let Some(url) = &self.api_url_override {
            return url;
        }
        if self.sandbox {
            API_BASE_SANDBOX
        } else {
            API_BASE_LIVE
        }
    }

    /// Buyer-facing checkout view for a processor payment order uuid.
    pub fn transaction_url(&self, uuid: &str) -> String {
        let base = if self.sandbox {
            TRANSACTION_VIEW_SANDBOX
        } else {
            TRANSACTION_VIEW_LIVE
        };
        format!("{}/{}", base, uuid)
    }

    /// Both credentials present. A half-configured gateway stays enabled
    /// and fails at initiation time instead.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid port number"))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

        let store_url = trim_base(
            env::var("STORE_URL").unwrap_or_else(|_| "http://localhost".to_string()),
        );
        let public_url = trim_base(
            env::var("PUBLIC_URL").unwrap_or_else(|_| format!("http://localhost:{}", server_port)),
        );

        let confirmations = ConfirmationTier::from_env_value(
            &env::var("CONFIRMATION_REQUESTS").unwrap_or_else(|_| "6".to_string()),
        )?;

        let gateway = GatewaySettings {
            enabled: env_flag("GATEWAY_ENABLED", true),
            title: env::var("GATEWAY_TITLE").unwrap_or_else(|_| "Bitcoin Payments".to_string()),
            description: env::var("GATEWAY_DESCRIPTION")
                .unwrap_or_else(|_| "Pay with Bitcoin".to_string()),
            show_logo: env_flag("GATEWAY_SHOW_LOGO", true),
            client_id: env::var("WEBPOS_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("WEBPOS_CLIENT_SECRET").unwrap_or_default(),
            confirmations,
            sandbox: env_flag("WEBPOS_SANDBOX", false),
            api_url_override: env::var("WEBPOS_API_URL").ok(),
        };

        Ok(Config {
            server_port,
            database_url,
            store_url,
            public_url,
            gateway,
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn trim_base(url: String) -> String {
    url.trim_end_matches('/').to_string()
}
