//! Polling of deferred result locations

use super::models::{DeferredJob, JobResult, JobStatus, PollBody};
use super::submitter::authorize;
use crate::config::Credentials;
use crate::error::{ConnectorError, Result};
use crate::network::{ApiRequest, Transport};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Fixed poll cadence and budget
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            timeout: Duration::from_secs(300),
        }
    }
}

impl From<&crate::config::QuerySettings> for PollPolicy {
    fn from(settings: &crate::config::QuerySettings) -> Self {
        Self {
            interval: settings.poll_interval(),
            timeout: settings.timeout(),
        }
    }
}

/// Poll `job` until it completes, fails, or the budget runs out.
///
/// Each round sleeps `policy.interval`, checks the budget, then fetches the
/// result location. The budget is measured from the job's submission time.
pub async fn poll(
    transport: &dyn Transport,
    credentials: &Credentials,
    job: &DeferredJob,
    query: &str,
    policy: PollPolicy,
) -> Result<JobResult> {
    let token = &credentials.access_token;
    let mut attempt = 0u32;

    loop {
        sleep(policy.interval).await;

        if job.submitted_at.elapsed() > policy.timeout {
            warn!(
                "Deferred query timed out after {} polls ({:?})",
                attempt, policy.timeout
            );
            return Err(ConnectorError::Timeout {
                timeout: policy.timeout,
            });
        }

        attempt += 1;
        let request = authorize(ApiRequest::get(job.result_url.as_str()), credentials);
        let response = transport
            .send(request)
            .await
            .map_err(|e| ConnectorError::Transport {
                status: None,
                body: token.redact(&e.to_string()),
            })?;

        if !response.is_success() {
            return Err(ConnectorError::Transport {
                status: Some(response.status),
                body: token.redact(&response.text),
            });
        }

        let body: PollBody = response.json().map_err(|e| ConnectorError::Protocol {
            message: format!("poll response is not valid JSON: {}", e),
            raw: token.redact(&response.text),
        })?;
        let snapshot = JobResult::from_body(body);

        debug!("Poll {}: {}", attempt, snapshot.status);

        match snapshot.status {
            JobStatus::Completed => return Ok(snapshot),
            JobStatus::Failed => {
                let detail = snapshot
                    .error
                    .unwrap_or_else(|| "deferred query failed".to_string());
                return Err(ConnectorError::Query {
                    query: query.to_string(),
                    detail: token.redact(&detail),
                });
            }
            JobStatus::InProgress => continue,
        }
    }
}
