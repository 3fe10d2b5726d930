//! Assessor report parsing.
//!
//! Reports look like `{"score": 57, "issues": [{"severity": "HIGH", "title": ..., "description": ...}]}`.
//! The score may be fractional; it is rounded and clamped to 0..=100.

use serde_json::Value;
use std::path::Path;

use hardener_core::{AuditResult, Finding, Severity};

use super::AssessorFailure;

fn parse_issue(issue: &Value) -> Option<Finding> {
    let issue = issue.as_object()?;

    let severity = issue
        .get("severity")
        .and_then(Value::as_str)
        .map(Severity::parse_lenient)
        .unwrap_or(Severity::Low);
    let title = issue
        .get("title")
        .or_else(|| issue.get("id"))
        .and_then(Value::as_str)
        .unwrap_or("Untitled issue");
    let description = issue
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let finding = Finding::new(severity, title, description);
    let location = issue
        .get("location")
        .or_else(|| issue.get("path"))
        .and_then(Value::as_str);

    Some(match location {
        Some(location) => finding.at(location),
        None => finding,
    })
}

/// Normalize a parsed report.
pub fn parse_audit_report(report: &Value) -> Result<AuditResult, AssessorFailure> {
    let score = report
        .get("score")
        .and_then(Value::as_f64)
        .ok_or_else(|| AssessorFailure::Unparsable("missing numeric 'score'".to_string()))?;
    let score = score.round().clamp(0.0, 100.0) as u8;

    let findings = match report.get("issues") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(issues)) => issues.iter().filter_map(parse_issue).collect(),
        Some(_) => {
            return Err(AssessorFailure::Unparsable(
                "'issues' is not an array".to_string(),
            ))
        }
    };

    Ok(AuditResult::normal(score, findings))
}

/// Parse report text.
pub fn parse_audit_report_str(text: &str) -> Result<AuditResult, AssessorFailure> {
    let report: Value = serde_json::from_str(text)
        .map_err(|e| AssessorFailure::Unparsable(format!("invalid JSON: {}", e)))?;
    parse_audit_report(&report)
}

/// Load a previously written report to use as the first assessment.
///
/// Returns `None` (and logs why) when the file is absent or unparsable, so
/// the caller falls back to invoking the assessor.
pub fn load_seed_report(path: impl AsRef<Path>) -> Option<AuditResult> {
    let path = path.as_ref();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "No seed assessor report");
            return None;
        }
    };

    match parse_audit_report_str(&text) {
        Ok(result) => {
            tracing::info!(path = %path.display(), score = result.score, "Using seed assessor report");
            Some(result)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Ignoring unparsable seed report");
            None
        }
    }
}
