use std::time::Duration;

use crate::domain::types::GatewayCredentials;

/// How confirmation emails leave the service. Env var: `MAIL_MODE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailMode {
    /// Record messages in memory only.
    Sandbox,
    /// Post messages to `MAIL_RELAY_URL`.
    Http { relay_url: String },
}

/// Payments service configuration loaded from environment variables.
#[derive(Debug)]
pub struct PaymentsConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3120). Env var: `PAYMENTS_PORT`.
    pub payments_port: u16,
    /// Payment gateway API root. Env var: `GATEWAY_BASE_URL`.
    pub gateway_base_url: String,
    /// `None` unless both `GATEWAY_KEY_ID` and `GATEWAY_KEY_SECRET` are set.
    /// Requests that need the gateway then fail with a config error.
    pub gateway_credentials: Option<GatewayCredentials>,
    /// Per-request gateway timeout (default 10s). Env var: `GATEWAY_TIMEOUT_SECS`.
    pub gateway_timeout: Duration,
    /// Currency orders are issued in (default INR). Env var: `PAYMENT_CURRENCY`.
    pub currency: String,
    pub mail_mode: MailMode,
    /// Sender address. Env var: `MAIL_FROM`.
    pub mail_from: String,
}

impl PaymentsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let gateway_credentials = match (non_empty("GATEWAY_KEY_ID"), non_empty("GATEWAY_KEY_SECRET")) {
            (Some(key_id), Some(key_secret)) => Some(GatewayCredentials { key_id, key_secret }),
            _ => None,
        };

        let mail_mode = match non_empty("MAIL_MODE").as_deref() {
            Some("http") => MailMode::Http {
                relay_url: non_empty("MAIL_RELAY_URL").expect("MAIL_RELAY_URL"),
            },
            _ => MailMode::Sandbox,
        };

        Self {
            database_url: non_empty("DATABASE_URL").expect("DATABASE_URL"),
            payments_port: get("PAYMENTS_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3120),
            gateway_base_url: non_empty("GATEWAY_BASE_URL")
                .unwrap_or_else(|| "https://api.razorpay.com".to_owned()),
            gateway_credentials,
            gateway_timeout: Duration::from_secs(
                get("GATEWAY_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            currency: non_empty("PAYMENT_CURRENCY")
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| "INR".to_owned()),
            mail_mode,
            mail_from: non_empty("MAIL_FROM").unwrap_or_else(|| "events@campus.local".to_owned()),
        }
    }
}
