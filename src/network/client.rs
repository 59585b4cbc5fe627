//! reqwest-backed transport for the JupiterOne API

use super::types::{ApiRequest, ApiResponse, HttpMethod, Transport, TransportFailure};
use crate::config::OutgoingSettings;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper with connector-specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let mut builder =
            Client::builder().timeout(Duration::from_secs_f64(settings.request_timeout));

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        Ok(Self {
            client: builder.build()?,
            user_agent: format!("jupiterone-connector/{}", crate::VERSION),
        })
    }

    /// Current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn read_response(response: Response) -> Result<ApiResponse, TransportFailure> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportFailure(format!("failed to read response body: {}", e)))?;
        Ok(ApiResponse { status, text })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportFailure> {
        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder.header("User-Agent", &self.user_agent);

        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if let Some(body) = request.body {
            req_builder = req_builder.json(&body);
        }

        debug!("{:?} {}", request.method, request.url);

        // reqwest errors carry the URL only, never header values
        let response = req_builder
            .send()
            .await
            .map_err(|e| TransportFailure(e.to_string()))?;

        Self::read_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
        assert!(client.unwrap().user_agent().starts_with("jupiterone-connector/"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let client = HttpClient::new().unwrap();
        let result = client.send(ApiRequest::get("http://127.0.0.1:9/")).await;
        assert!(result.is_err());
    }
}
