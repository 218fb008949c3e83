//! Client configuration.

use bmx_rest::RestConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Construction-time configuration for [`crate::BitmexClient`].
///
/// Immutable after construction. The API secret only ever feeds the
/// request signer; it is never transmitted or logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base endpoint URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Trading symbol.
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    /// Prefix for generated client order IDs; also used to filter the
    /// open-orders feed view down to this client's orders.
    #[serde(default)]
    pub order_id_prefix: String,
    /// Value of the `user-agent` header.
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    /// Transport timeout per request attempt, in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Signature validity window, in seconds.
    #[serde(default = "default_expiration_window_secs")]
    pub expiration_window_secs: i64,
}

fn default_base_url() -> String {
    "https://testnet.bitmex.com/api/v1/".to_string()
}

fn default_symbol() -> String {
    "XBTUSD".to_string()
}

fn default_agent_name() -> String {
    "trading_bot".to_string()
}

fn default_http_timeout_secs() -> u64 {
    7
}

fn default_expiration_window_secs() -> i64 {
    3600
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            symbol: default_symbol(),
            api_key: String::new(),
            api_secret: String::new(),
            order_id_prefix: String::new(),
            agent_name: default_agent_name(),
            http_timeout_secs: default_http_timeout_secs(),
            expiration_window_secs: default_expiration_window_secs(),
        }
    }
}

impl ClientConfig {
    pub(crate) fn rest_config(&self) -> RestConfig {
        RestConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            symbol: self.symbol.clone(),
            order_id_prefix: self.order_id_prefix.clone(),
            agent_name: self.agent_name.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
            expiration_window_secs: self.expiration_window_secs,
        }
    }
}
