//! JupiterOne connector service
//!
//! Serves the query endpoint and the alert webhook for the workflow host.

use anyhow::Result;
use jupiterone_connector::{
    config,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting jupiterone-connector v{}", jupiterone_connector::VERSION);

    let settings = config::load()?;
    if settings.credentials.account_id.is_empty() || settings.credentials.access_token.is_empty() {
        warn!("Credentials are incomplete; queries will fail until J1_ACCOUNT_ID and J1_ACCESS_TOKEN are set");
    }

    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    let (state, mut alerts) = AppState::new(&settings, Arc::new(client));

    // Downstream consumer for accepted alerts
    tokio::spawn(async move {
        while let Some(alert) = alerts.recv().await {
            match serde_json::to_string(&alert) {
                Ok(json) => info!(target: "alerts", "{}", json),
                Err(e) => warn!("Failed to serialize alert: {}", e),
            }
        }
    });

    let app = create_router(state);

    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
