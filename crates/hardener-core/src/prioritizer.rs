//! Issue prioritizer: severity bucketing with fixed per-bucket caps.
//!
//! The caps are policy, not configuration. They keep correction
//! instructions bounded no matter how many findings the assessor reports.

use serde::{Deserialize, Serialize};

use crate::types::{Finding, Severity};

/// Maximum CRITICAL findings handed to a corrector.
pub const CRITICAL_CAP: usize = 5;

/// Maximum HIGH findings handed to a corrector.
pub const HIGH_CAP: usize = 5;

/// Maximum MEDIUM findings handed to a corrector.
pub const MEDIUM_CAP: usize = 3;

/// Bounded, severity-bucketed view of an audit's findings.
///
/// Within each bucket the assessor's original order is preserved.
/// LOW findings are never forwarded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrioritizedFindings {
    pub critical: Vec<Finding>,
    pub high: Vec<Finding>,
    pub medium: Vec<Finding>,
}

impl PrioritizedFindings {
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.high.is_empty() && self.medium.is_empty()
    }

    pub fn len(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len()
    }

    /// All findings, CRITICAL first, then HIGH, then MEDIUM.
    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.critical
            .iter()
            .chain(self.high.iter())
            .chain(self.medium.iter())
    }
}

/// Bucket findings by severity and cap each bucket.
pub fn prioritize(findings: &[Finding]) -> PrioritizedFindings {
    let bucket = |severity: Severity, cap: usize| -> Vec<Finding> {
        findings
            .iter()
            .filter(|f| f.severity == severity)
            .take(cap)
            .cloned()
            .collect()
    };

    PrioritizedFindings {
        critical: bucket(Severity::Critical, CRITICAL_CAP),
        high: bucket(Severity::High, HIGH_CAP),
        medium: bucket(Severity::Medium, MEDIUM_CAP),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity, title: &str) -> Finding {
        Finding::new(severity, title, "")
    }

    #[test]
    fn test_buckets_are_capped() {
        let mut findings = Vec::new();
        for i in 0..8 {
            findings.push(finding(Severity::Critical, &format!("c{}", i)));
            findings.push(finding(Severity::High, &format!("h{}", i)));
            findings.push(finding(Severity::Medium, &format!("m{}", i)));
            findings.push(finding(Severity::Low, &format!("l{}", i)));
        }

        let prioritized = prioritize(&findings);
        assert_eq!(prioritized.critical.len(), CRITICAL_CAP);
        assert_eq!(prioritized.high.len(), HIGH_CAP);
        assert_eq!(prioritized.medium.len(), MEDIUM_CAP);
        assert_eq!(prioritized.len(), 13);
    }

    #[test]
    fn test_original_order_preserved() {
        let findings = vec![
            finding(Severity::High, "first"),
            finding(Severity::Critical, "only-critical"),
            finding(Severity::High, "second"),
            finding(Severity::High, "third"),
        ];

        let prioritized = prioritize(&findings);
        let titles: Vec<&str> = prioritized.high.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second", "third"]);

        let all: Vec<&str> = prioritized.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(all, vec!["only-critical", "first", "second", "third"]);
    }

    #[test]
    fn test_low_only_is_empty() {
        let prioritized = prioritize(&[finding(Severity::Low, "nit")]);
        assert!(prioritized.is_empty());
    }
}
