//! Data models for deferred query execution

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

/// Server-side state of a deferred job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// Parse a poll `status` value. Unknown or missing values count as
    /// still running so newer intermediate states do not break polling.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("COMPLETED") => Self::Completed,
            Some("FAILED") => Self::Failed,
            _ => Self::InProgress,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A submitted query whose results live behind `result_url`
#[derive(Debug, Clone)]
pub struct DeferredJob {
    /// Short-lived result location returned by the submission
    pub result_url: String,
    /// When the submission was accepted; the poll budget counts from here
    pub submitted_at: Instant,
}

impl DeferredJob {
    pub fn new(result_url: impl Into<String>) -> Self {
        Self {
            result_url: result_url.into(),
            submitted_at: Instant::now(),
        }
    }
}

/// Raw body of a poll response
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct PollBody {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Latest snapshot of a deferred job, replaced wholesale on every poll
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub status: JobStatus,
    pub rows: Vec<Value>,
    pub cursor: Option<String>,
    pub error: Option<String>,
}

impl JobResult {
    pub(crate) fn from_body(body: PollBody) -> Self {
        let rows = match body.data {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(rows)) => rows,
            // table/tree results arrive as one object
            Some(other) => vec![other],
        };
        let error = body.error.map(|e| match e {
            Value::String(s) => s,
            other => other.to_string(),
        });

        Self {
            status: JobStatus::parse(body.status.as_deref()),
            rows,
            cursor: body.cursor.filter(|c| !c.is_empty()),
            error,
        }
    }
}

/// Rows gathered so far across pages
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    pub rows: Vec<Value>,
    pub cursor: Option<String>,
    pub cap: usize,
    /// Completed submit/poll cycles
    pub pages: usize,
}

impl Accumulator {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            ..Default::default()
        }
    }

    /// Append a completed page and adopt its cursor.
    ///
    /// Returns `true` when paging should stop.
    pub fn absorb(&mut self, page: JobResult) -> bool {
        let page_len = page.rows.len();
        self.rows.extend(page.rows);
        self.cursor = page.cursor;
        self.pages += 1;

        self.cursor.is_none() || page_len == 0 || self.rows.len() >= self.cap
    }
}

/// Externally visible result of one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    /// Query text as the caller supplied it
    pub query: String,
    pub rows: Vec<Value>,
    pub cap: usize,
    /// Cursor left by the last page, if the source has more rows. `None`
    /// when the last page was trimmed to the cap.
    pub cursor: Option<String>,
    pub pages: usize,
    pub generated_at: DateTime<Utc>,
}

/// Failure reported in place of rows when continue-on-failure is enabled
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    pub query: String,
    pub error: String,
    pub kind: String,
    pub timestamp: DateTime<Utc>,
}

/// Result of one invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    Envelope(ResultEnvelope),
    Failure(FailureRecord),
}

impl Outcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(rows: Vec<Value>, cursor: Option<&str>) -> JobResult {
        JobResult {
            status: JobStatus::Completed,
            rows,
            cursor: cursor.map(String::from),
            error: None,
        }
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(JobStatus::parse(Some("COMPLETED")), JobStatus::Completed);
        assert_eq!(JobStatus::parse(Some("FAILED")), JobStatus::Failed);
        assert_eq!(JobStatus::parse(Some("IN_PROGRESS")), JobStatus::InProgress);
        assert_eq!(JobStatus::parse(Some("QUEUED")), JobStatus::InProgress);
        assert_eq!(JobStatus::parse(None), JobStatus::InProgress);
    }

    #[test]
    fn test_job_result_from_body() {
        let body: PollBody = serde_json::from_value(json!({
            "status": "COMPLETED",
            "data": [{"id": 1}],
            "cursor": ""
        }))
        .unwrap();
        let result = JobResult::from_body(body);
        assert_eq!(result.rows, vec![json!({"id": 1})]);
        assert_eq!(result.cursor, None);

        let body: PollBody = serde_json::from_value(json!({"status": "COMPLETED"})).unwrap();
        assert!(JobResult::from_body(body).rows.is_empty());
    }

    #[test]
    fn test_job_result_error_object_is_rendered() {
        let body: PollBody = serde_json::from_value(json!({
            "status": "FAILED",
            "error": {"message": "bad query"}
        }))
        .unwrap();
        let result = JobResult::from_body(body);
        assert_eq!(result.status, JobStatus::Failed);
        assert!(result.error.unwrap().contains("bad query"));
    }

    #[test]
    fn test_accumulator_stops_on_empty_cursor() {
        let mut acc = Accumulator::new(10);
        assert!(!acc.absorb(page(vec![json!(1), json!(2)], Some("a"))));
        assert!(acc.absorb(page(vec![json!(3)], None)));
        assert_eq!(acc.rows, vec![json!(1), json!(2), json!(3)]);
        assert_eq!(acc.pages, 2);
    }

    #[test]
    fn test_accumulator_stops_on_empty_page() {
        let mut acc = Accumulator::new(10);
        assert!(acc.absorb(page(vec![], Some("a"))));
        assert_eq!(acc.cursor.as_deref(), Some("a"));
    }

    #[test]
    fn test_accumulator_stops_at_cap() {
        let mut acc = Accumulator::new(2);
        assert!(acc.absorb(page(vec![json!(1), json!(2), json!(3)], Some("a"))));
    }

    #[test]
    fn test_outcome_serializes_untagged() {
        let failure = Outcome::Failure(FailureRecord {
            query: "FIND Host".into(),
            error: "boom".into(),
            kind: "QueryError".into(),
            timestamp: Utc::now(),
        });
        let value = serde_json::to_value(&failure).unwrap();
        assert_eq!(value["kind"], "QueryError");
        assert!(failure.is_failure());
    }
}
