//! Report aggregator: a pure summary over a concluded session's history.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::session::Session;
use crate::types::{Outcome, Severity};

/// Summary of one hardening session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub iterations_used: u32,
    pub initial_score: u8,
    pub final_score: u8,

    /// `final_score - initial_score`, negative on regression
    pub score_delta: i16,

    /// Per-severity reduction between the first and last record.
    /// Only severities whose count went down appear.
    pub findings_resolved_by_severity: BTreeMap<Severity, usize>,

    pub target_achieved: bool,

    /// Human-readable improvement lines
    pub improvements: Vec<String>,

    pub outcome: Outcome,
}

/// Summarize a concluded session.
pub fn summarize(session: &Session) -> SessionSummary {
    let (first, last) = match (session.first_record(), session.last_record()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return SessionSummary {
                iterations_used: 0,
                initial_score: 0,
                final_score: 0,
                score_delta: 0,
                findings_resolved_by_severity: BTreeMap::new(),
                target_achieved: false,
                improvements: Vec::new(),
                outcome: session.outcome,
            }
        }
    };

    let initial_score = first.score();
    let final_score = last.score();
    let score_delta = final_score as i16 - initial_score as i16;

    let before = first.audit.severity_counts();
    let after = last.audit.severity_counts();
    let findings_resolved_by_severity: BTreeMap<Severity, usize> = Severity::ALL
        .iter()
        .filter_map(|severity| {
            let was = before.get(severity).copied().unwrap_or(0);
            let now = after.get(severity).copied().unwrap_or(0);
            (was > now).then(|| (*severity, was - now))
        })
        .collect();

    let improvements = if session.history.len() == 1 {
        vec!["Initial assessment completed".to_string()]
    } else {
        improvement_lines(
            score_delta,
            &findings_resolved_by_severity,
            first.audit.findings.len(),
            last.audit.findings.len(),
        )
    };

    SessionSummary {
        iterations_used: session.iterations_used(),
        initial_score,
        final_score,
        score_delta,
        findings_resolved_by_severity,
        target_achieved: final_score >= session.target_score,
        improvements,
        outcome: session.outcome,
    }
}

fn improvement_lines(
    score_delta: i16,
    resolved: &BTreeMap<Severity, usize>,
    findings_before: usize,
    findings_after: usize,
) -> Vec<String> {
    let mut lines = Vec::new();

    if score_delta > 0 {
        lines.push(format!("Score improved by {} points", score_delta));
    } else if score_delta < 0 {
        lines.push(format!("Score regressed by {} points", -score_delta));
    }

    for (severity, count) in resolved {
        lines.push(format!(
            "Resolved {} {} findings",
            count,
            severity.as_str().to_ascii_lowercase()
        ));
    }

    if findings_before > findings_after {
        lines.push(format!(
            "Reduced total findings by {}",
            findings_before - findings_after
        ));
    }

    if lines.is_empty() {
        lines.push("Artifact maintained its quality level".to_string());
    }
    lines
}
