//! Final result packaging

use super::models::{Accumulator, ResultEnvelope};
use crate::query::QuerySpec;
use chrono::Utc;

/// Trim accumulated rows to the cap and attach provenance.
///
/// When trimming drops rows the cursor is cleared: it points past the
/// dropped rows and resuming from it would skip them.
pub fn assemble(spec: &QuerySpec, mut acc: Accumulator) -> ResultEnvelope {
    // the last page may overshoot
    let trimmed = acc.rows.len() > spec.cap;
    acc.rows.truncate(spec.cap);
    let cursor = if trimmed { None } else { acc.cursor };

    ResultEnvelope {
        query: spec.original.clone(),
        rows: acc.rows,
        cap: spec.cap,
        cursor,
        pages: acc.pages,
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trims_overshoot() {
        let spec = QuerySpec {
            original: "FIND Host LIMIT 2".to_string(),
            text: "FIND Host".to_string(),
            cap: 4,
        };
        let acc = Accumulator {
            rows: (1..=6).map(|n| json!(n)).collect(),
            cursor: Some("b".to_string()),
            cap: 4,
            pages: 2,
        };

        let envelope = assemble(&spec, acc);
        assert_eq!(envelope.rows, vec![json!(1), json!(2), json!(3), json!(4)]);
        assert_eq!(envelope.cap, 4);
        assert_eq!(envelope.query, "FIND Host LIMIT 2");
        assert_eq!(envelope.cursor, None);
    }

    #[test]
    fn test_exact_fill_keeps_cursor() {
        let spec = QuerySpec {
            original: "FIND Host".to_string(),
            text: "FIND Host".to_string(),
            cap: 3,
        };
        let acc = Accumulator {
            rows: (1..=3).map(|n| json!(n)).collect(),
            cursor: Some("c".to_string()),
            cap: 3,
            pages: 1,
        };

        assert_eq!(assemble(&spec, acc).cursor.as_deref(), Some("c"));
    }

    #[test]
    fn test_short_result_untouched() {
        let spec = QuerySpec {
            original: "FIND Host".to_string(),
            text: "FIND Host".to_string(),
            cap: 10,
        };
        let mut acc = Accumulator::new(10);
        acc.rows = vec![json!(1)];

        assert_eq!(assemble(&spec, acc).rows.len(), 1);
    }
}
