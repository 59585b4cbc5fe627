//! Error taxonomy for the deferred query pipeline

use crate::secret::Secret;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while normalizing, submitting, polling or paging a query.
///
/// None of these are retried; each aborts the current pipeline.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Bad limit or query text, detected before any request is sent
    #[error("validation error: {0}")]
    Validation(String),

    /// Required credential missing, detected before any request is sent
    #[error("credential error: {0}")]
    Credential(String),

    /// Network failure or non-2xx response
    #[error("transport error{}: {body}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Transport { status: Option<u16>, body: String },

    /// GraphQL errors on submission, or a FAILED deferred job
    #[error("query error for `{query}`: {detail}")]
    Query { query: String, detail: String },

    /// Success response with an unexpected shape
    #[error("protocol error: {message}; response: {raw}")]
    Protocol { message: String, raw: String },

    /// The deferred job did not finish within the poll budget
    #[error("timeout error: deferred query did not complete within {}s", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },
}

impl ConnectorError {
    /// Taxonomy name used in failure records and HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Credential(_) => "CredentialError",
            Self::Transport { .. } => "TransportError",
            Self::Query { .. } => "QueryError",
            Self::Protocol { .. } => "ProtocolError",
            Self::Timeout { .. } => "TimeoutError",
        }
    }

    /// Whether the failure was detected locally, before any network call
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Credential(_))
    }

    /// Render the message with every occurrence of `token` masked
    pub fn redacted_message(&self, token: &Secret) -> String {
        token.redact(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
