//! Query normalization
//!
//! Turns raw J1QL text and an untyped limit parameter into a [`QuerySpec`]:
//! - the effective cap (`1..=max_cap`, defaulting to `max_cap`)
//! - the query text with any trailing `LIMIT <n>` clause removed
//!
//! Paging is driven by the API cursor, so a residual LIMIT clause would cap
//! every page instead of the whole result.

use crate::error::{ConnectorError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

static TRAILING_LIMIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|\s+)LIMIT\s+\d+\s*;?\s*$").expect("valid regex"));

/// Normalized, immutable query input for one invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    /// Query text exactly as the caller supplied it
    pub original: String,
    /// Query text without a trailing LIMIT clause
    pub text: String,
    /// Maximum number of rows to return across all pages
    pub cap: usize,
}

impl QuerySpec {
    /// Validate and normalize a raw query and limit.
    ///
    /// Fails with [`ConnectorError::Validation`] when the query text is blank
    /// or the limit exceeds `max_cap`.
    pub fn normalize(raw: &str, limit: Option<&Value>, max_cap: u32) -> Result<Self> {
        let cap = effective_cap(limit, max_cap)?;
        let text = strip_limit(raw);
        if text.is_empty() {
            return Err(ConnectorError::Validation(
                "query text is required".to_string(),
            ));
        }
        Ok(Self {
            original: raw.to_string(),
            text,
            cap,
        })
    }
}

/// Resolve the cap from the host-supplied limit.
///
/// Absent, non-positive and non-numeric limits all mean "as many as allowed".
pub fn effective_cap(limit: Option<&Value>, max_cap: u32) -> Result<usize> {
    let max_cap = max_cap as usize;
    let (value, requested) = match limit.and_then(|v| parse_limit(v).map(|n| (v, n))) {
        Some((v, n)) if n > 0 => (v, n),
        _ => return Ok(max_cap),
    };

    if requested > max_cap as i64 {
        let cited = match value {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        return Err(ConnectorError::Validation(format!(
            "limit {} exceeds the maximum of {}",
            cited, max_cap
        )));
    }
    Ok(requested as usize)
}

/// Read an integer out of a JSON number or numeric string
fn parse_limit(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Remove a trailing, case-insensitive `LIMIT <n>` clause
pub fn strip_limit(raw: &str) -> String {
    TRAILING_LIMIT.replace(raw.trim(), "").trim().to_string()
}
