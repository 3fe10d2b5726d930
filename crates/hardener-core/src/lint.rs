//! Lint report parsing.
//!
//! Lint reports are a JSON array of `{code, message, path, severity}` entries
//! with numeric severities (0 = error, 1 = warning, 2 = info, 3 = hint).
//! Errors become HIGH findings, warnings MEDIUM; everything else is dropped.

use serde_json::Value;

use crate::types::{Finding, Severity};

fn lint_severity(level: i64) -> Option<Severity> {
    match level {
        0 => Some(Severity::High),
        1 => Some(Severity::Medium),
        _ => None,
    }
}

/// Render a lint `path` (array of segments or a plain string).
fn lint_location(path: &Value) -> Option<String> {
    match path {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(segments) if !segments.is_empty() => Some(
            segments
                .iter()
                .map(|s| match s {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("."),
        ),
        _ => None,
    }
}

/// Convert a parsed lint report into findings. Malformed entries are skipped.
pub fn parse_lint_report(report: &Value) -> Vec<Finding> {
    let Some(entries) = report.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let severity = entry.get("severity").and_then(Value::as_i64).and_then(lint_severity)?;
            let code = entry.get("code").and_then(Value::as_str).unwrap_or("lint");
            let message = entry.get("message").and_then(Value::as_str).unwrap_or_default();

            let finding = Finding::new(severity, code, message);
            Some(match entry.get("path").and_then(lint_location) {
                Some(location) => finding.at(location),
                None => finding,
            })
        })
        .collect()
}

/// Parse lint report text. Unparsable text yields no findings.
pub fn parse_lint_report_str(text: &str) -> Vec<Finding> {
    match serde_json::from_str::<Value>(text) {
        Ok(report) => parse_lint_report(&report),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring unparsable lint report");
            Vec::new()
        }
    }
}
