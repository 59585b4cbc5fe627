//! Settings structures for the connector

use crate::secret::Secret;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default API endpoint (US region)
pub const DEFAULT_API_BASE_URL: &str = "https://api.us.jupiterone.io";

/// Upper bound on rows returned by one invocation
pub const DEFAULT_MAX_CAP: u32 = 10_000;

/// Main settings structure, as read from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub credentials: Credentials,
    pub query: QuerySettings,
    pub outgoing: OutgoingSettings,
    pub server: ServerSettings,
    pub webhook: WebhookSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables (J1_* prefix)
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("J1_ACCOUNT_ID") {
            self.credentials.account_id = val;
        }
        if let Ok(val) = std::env::var("J1_ACCESS_TOKEN") {
            self.credentials.access_token = Secret::new(val);
        }
        if let Ok(val) = std::env::var("J1_API_BASE_URL") {
            self.credentials.api_base_url = val;
        }
        if let Ok(val) = std::env::var("J1_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("J1_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("J1_WEBHOOK_SECRET") {
            self.webhook.secret = Some(Secret::new(val));
        }
    }
}

/// Account credentials, normally supplied by the host's credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// JupiterOne account id (sent as `JupiterOne-Account`)
    pub account_id: String,
    /// API access token (sent as a bearer token)
    pub access_token: Secret,
    /// API base URL
    pub api_base_url: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            access_token: Secret::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl Credentials {
    pub fn new(
        account_id: impl Into<String>,
        access_token: impl Into<Secret>,
        api_base_url: impl Into<String>,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            access_token: access_token.into(),
            api_base_url: api_base_url.into(),
        }
    }

    /// GraphQL endpoint, falling back to the default base URL when unset
    pub fn graphql_url(&self) -> String {
        let base = self.api_base_url.trim().trim_end_matches('/');
        let base = if base.is_empty() {
            DEFAULT_API_BASE_URL
        } else {
            base
        };
        format!("{}/graphql", base)
    }
}

/// Deferred query tuning; injected so tests can shorten the budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Maximum cap a caller may request
    pub max_cap: u32,
    /// Fixed delay between polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Overall poll budget per deferred job, in seconds
    pub timeout_secs: u64,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            max_cap: DEFAULT_MAX_CAP,
            poll_interval_ms: 1_000,
            timeout_secs: 300,
        }
    }
}

impl QuerySettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Per-request timeout in seconds
    pub request_timeout: f64,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8787,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Alert webhook settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Header carrying the shared secret
    pub secret_header: String,
    /// Shared secret; when unset every request is accepted
    pub secret: Option<Secret>,
    /// Capacity of the downstream alert channel
    pub channel_capacity: usize,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            secret_header: "x-webhook-secret".to_string(),
            secret: None,
            channel_capacity: 256,
        }
    }
}
