//! End-to-end execution of one query invocation

use super::assembler::assemble;
use super::models::{FailureRecord, Outcome, ResultEnvelope};
use super::pager::fetch_pages;
use super::poller::PollPolicy;
use crate::config::{Credentials, QuerySettings};
use crate::error::{ConnectorError, Result};
use crate::network::Transport;
use crate::query::QuerySpec;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

/// Runs queries against one account: normalize, page, assemble.
///
/// Holds no per-invocation state, so one client can serve many
/// invocations concurrently.
#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
    settings: QuerySettings,
}

impl QueryClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        credentials: Credentials,
        settings: QuerySettings,
    ) -> Self {
        Self {
            transport,
            credentials,
            settings,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Run `query` with an optional host-supplied limit
    pub async fn run(&self, query: &str, limit: Option<&Value>) -> Result<ResultEnvelope> {
        let spec = QuerySpec::normalize(query, limit, self.settings.max_cap)?;
        info!("Running query (cap {})", spec.cap);

        let policy = PollPolicy::from(&self.settings);
        let acc = fetch_pages(self.transport.as_ref(), &self.credentials, &spec, policy).await?;
        Ok(assemble(&spec, acc))
    }

    /// Run `query`; with `continue_on_fail` a failure becomes a
    /// [`FailureRecord`] instead of an error.
    pub async fn invoke(
        &self,
        query: &str,
        limit: Option<&Value>,
        continue_on_fail: bool,
    ) -> Result<Outcome> {
        match self.run(query, limit).await {
            Ok(envelope) => Ok(Outcome::Envelope(envelope)),
            Err(err) if continue_on_fail => {
                error!("Query failed, continuing: {}", self.redact(&err));
                Ok(Outcome::Failure(self.failure_record(query, &err)))
            }
            Err(err) => Err(err),
        }
    }

    /// Build a failure record with the token masked
    pub fn failure_record(&self, query: &str, err: &ConnectorError) -> FailureRecord {
        FailureRecord {
            query: query.to_string(),
            error: self.redact(err),
            kind: err.kind().to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn redact(&self, err: &ConnectorError) -> String {
        err.redacted_message(&self.credentials.access_token)
    }
}
