//! Application state shared across handlers

use crate::config::{Settings, WebhookSettings};
use crate::deferred::QueryClient;
use crate::network::Transport;
use crate::webhook::Alert;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Query pipeline for the configured account
    pub client: Arc<QueryClient>,
    /// Webhook validation settings
    pub webhook: Arc<WebhookSettings>,
    /// Downstream sink for normalized alerts
    pub alerts: mpsc::Sender<Alert>,
}

impl AppState {
    /// Create new application state and the receiving end of the alert channel
    pub fn new(
        settings: &Settings,
        transport: Arc<dyn Transport>,
    ) -> (Self, mpsc::Receiver<Alert>) {
        let (alerts, rx) = mpsc::channel(settings.webhook.channel_capacity.max(1));
        let client = QueryClient::new(
            transport,
            settings.credentials.clone(),
            settings.query.clone(),
        );

        let state = Self {
            client: Arc::new(client),
            webhook: Arc::new(settings.webhook.clone()),
            alerts,
        };
        (state, rx)
    }

    /// Configured webhook secret, if any
    pub fn webhook_secret(&self) -> Option<&str> {
        self.webhook
            .secret
            .as_ref()
            .filter(|s| !s.is_empty())
            .map(|s| s.expose())
    }
}
