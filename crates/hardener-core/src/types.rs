//! Shared types for assessment results and session outcomes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity of a finding, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Parse a severity label case-insensitively.
    ///
    /// Labels outside the four known buckets (e.g. "INFO") map to `Low`.
    pub fn parse_lenient(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "CRITICAL" => Severity::Critical,
            "HIGH" => Severity::High,
            "MEDIUM" => Severity::Medium,
            _ => Severity::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Where in the document the issue applies (e.g. a JSON pointer)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Finding {
    pub fn new(severity: Severity, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            description: description.into(),
            location: None,
        }
    }

    /// Attach a location.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.title)?;
        if !self.description.is_empty() {
            write!(f, " - {}", self.description)?;
        }
        if let Some(location) = &self.location {
            write!(f, " @ {}", location)?;
        }
        Ok(())
    }
}

/// Whether an audit came from the assessor or was synthesized after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOrigin {
    Normal,
    Degraded,
}

/// Normalized assessor output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditResult {
    /// Quality score, 0-100
    pub score: u8,

    /// Findings in assessor order
    pub findings: Vec<Finding>,

    pub origin: AuditOrigin,
}

/// Title of the synthetic finding carried by degraded results.
pub const DEGRADED_FINDING_TITLE: &str = "Assessment unavailable";

impl AuditResult {
    /// A result reported by the assessor. Scores above 100 are clamped.
    pub fn normal(score: u8, findings: Vec<Finding>) -> Self {
        Self {
            score: score.min(100),
            findings,
            origin: AuditOrigin::Normal,
        }
    }

    /// A result synthesized after the assessor could not produce one.
    ///
    /// Always scores 0 and carries exactly one CRITICAL finding that
    /// describes the failure.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            score: 0,
            findings: vec![Finding::new(
                Severity::Critical,
                DEGRADED_FINDING_TITLE,
                reason,
            )],
            origin: AuditOrigin::Degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.origin == AuditOrigin::Degraded
    }

    /// Count of findings per severity. Every severity has an entry.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        for finding in &self.findings {
            *counts.entry(finding.severity).or_default() += 1;
        }
        counts
    }
}

/// Which correction strategy produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Generative,
    Deterministic,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Generative => write!(f, "generative"),
            StrategyKind::Deterministic => write!(f, "deterministic"),
        }
    }
}

/// Terminal outcome of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// An assessment reached the target score
    TargetAchieved,

    /// The last allowed iteration finished below target
    BudgetExhausted,

    /// A correction produced an invalid artifact; the last valid one was kept
    CorrectionFailed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::TargetAchieved => "TARGET_ACHIEVED",
            Outcome::BudgetExhausted => "BUDGET_EXHAUSTED",
            Outcome::CorrectionFailed => "CORRECTION_FAILED",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse_lenient() {
        assert_eq!(Severity::parse_lenient("critical"), Severity::Critical);
        assert_eq!(Severity::parse_lenient(" High "), Severity::High);
        assert_eq!(Severity::parse_lenient("MEDIUM"), Severity::Medium);
        assert_eq!(Severity::parse_lenient("info"), Severity::Low);
    }

    #[test]
    fn test_severity_serde_uppercase() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }

    #[test]
    fn test_degraded_result_shape() {
        let result = AuditResult::degraded("assessor timed out after 120s");
        assert_eq!(result.score, 0);
        assert!(result.is_degraded());
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Critical);
        assert!(result.findings[0].description.contains("timed out"));
    }

    #[test]
    fn test_normal_clamps_score() {
        assert_eq!(AuditResult::normal(140, vec![]).score, 100);
    }

    #[test]
    fn test_severity_counts() {
        let result = AuditResult::normal(
            50,
            vec![
                Finding::new(Severity::High, "a", ""),
                Finding::new(Severity::High, "b", ""),
                Finding::new(Severity::Low, "c", ""),
            ],
        );
        let counts = result.severity_counts();
        assert_eq!(counts[&Severity::High], 2);
        assert_eq!(counts[&Severity::Critical], 0);
        assert_eq!(counts[&Severity::Low], 1);
    }

    #[test]
    fn test_finding_display() {
        let finding = Finding::new(Severity::High, "No auth", "Operation is unauthenticated")
            .at("#/paths/~1orders/get");
        assert_eq!(
            finding.to_string(),
            "HIGH: No auth - Operation is unauthenticated @ #/paths/~1orders/get"
        );
    }
}
