//! Alert webhook validation and normalization
//!
//! Incoming alert payloads are checked against an optional shared secret and
//! flattened into a common shape before being handed downstream.

use chrono::Utc;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a webhook request was rejected
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing or invalid webhook secret")]
    Unauthorized,
    #[error("invalid alert payload: {0}")]
    BadPayload(String),
}

/// Normalized alert forwarded downstream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub rule_name: Option<String>,
    pub severity: String,
    pub triggered_at: String,
    /// Every field of the original payload
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Alert {
    /// Parse and normalize a raw request body
    pub fn from_body(body: &[u8]) -> Result<Self, WebhookError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| WebhookError::BadPayload(e.to_string()))?;
        match value {
            Value::Object(fields) => Ok(Self::normalize(fields)),
            _ => Err(WebhookError::BadPayload(
                "expected a JSON object".to_string(),
            )),
        }
    }

    pub fn normalize(mut fields: Map<String, Value>) -> Self {
        let rule_name = first_str(&fields, &["/ruleName", "/rule/name", "/name"]);
        let severity = first_str(&fields, &["/severity", "/level"])
            .unwrap_or_else(|| "UNKNOWN".to_string());
        let triggered_at = first_str(&fields, &["/triggeredAt", "/timestamp"])
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        // normalized keys take precedence over the originals
        fields.remove("ruleName");
        fields.remove("severity");
        fields.remove("triggeredAt");

        Self {
            rule_name,
            severity,
            triggered_at,
            fields,
        }
    }
}

fn first_str(fields: &Map<String, Value>, pointers: &[&str]) -> Option<String> {
    let root = Value::Object(fields.clone());
    pointers.iter().find_map(|p| match root.pointer(p) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Check the shared secret header, if a secret is configured
pub fn verify_secret(expected: Option<&str>, provided: Option<&str>) -> Result<(), WebhookError> {
    match expected {
        None => Ok(()),
        Some(expected) => match provided {
            Some(provided) if constant_time_eq(expected.as_bytes(), provided.as_bytes()) => Ok(()),
            _ => Err(WebhookError::Unauthorized),
        },
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
