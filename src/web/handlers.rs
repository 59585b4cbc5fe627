//! HTTP request handlers

use super::state::AppState;
use crate::deferred::Outcome;
use crate::error::ConnectorError;
use crate::webhook::{verify_secret, Alert, WebhookError};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

/// One query invocation requested by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryItem {
    pub query: String,
    #[serde(default)]
    pub limit: Option<Value>,
}

/// Batch of independent invocations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryBatch {
    pub items: Vec<QueryItem>,
    #[serde(default)]
    pub continue_on_fail: bool,
}

/// Query handler. Items run as independent pipelines; results keep item order.
pub async fn query(State(state): State<AppState>, Json(batch): Json<QueryBatch>) -> Response {
    info!("Received query batch with {} item(s)", batch.items.len());

    let runs = batch.items.iter().map(|item| {
        state
            .client
            .invoke(&item.query, item.limit.as_ref(), batch.continue_on_fail)
    });
    let outcomes = join_all(runs).await;

    let mut results: Vec<Outcome> = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok(outcome) => results.push(outcome),
            Err(err) => return error_response(&state, &err),
        }
    }

    Json(json!({ "results": results })).into_response()
}

fn error_response(state: &AppState, err: &ConnectorError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::BAD_GATEWAY
    };
    let message = state.client.redact(err);
    warn!("Query failed: {}", message);
    (
        status,
        Json(json!({ "error": message, "kind": err.kind() })),
    )
        .into_response()
}

/// Alert webhook handler
pub async fn webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let provided = headers
        .get(state.webhook.secret_header.as_str())
        .and_then(|v| v.to_str().ok());

    let alert = verify_secret(state.webhook_secret(), provided).and_then(|_| Alert::from_body(&body));

    match alert {
        Ok(alert) => {
            info!(
                "Accepted alert {:?} (severity {})",
                alert.rule_name, alert.severity
            );
            match state.alerts.try_send(alert) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => warn!("Alert channel full, dropping alert"),
                Err(TrySendError::Closed(_)) => warn!("Alert channel closed, dropping alert"),
            }
            Json(json!({ "status": "ok" })).into_response()
        }
        Err(WebhookError::Unauthorized) => {
            warn!("Rejected webhook request: bad secret");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "status": "error", "message": WebhookError::Unauthorized.to_string() })),
            )
                .into_response()
        }
        Err(err @ WebhookError::BadPayload(_)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": err.to_string() })),
        )
            .into_response(),
    }
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
