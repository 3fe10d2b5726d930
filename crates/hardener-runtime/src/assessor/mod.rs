//! Assessor adapter: runs the external scorer and always yields a usable result.
//!
//! Every call is bounded by [`ASSESSOR_TIMEOUT`]. Timeouts, a missing tool,
//! a missing report and unparsable output are all downgraded to a DEGRADED
//! [`AuditResult`] (score 0, one synthetic CRITICAL finding). Nothing here
//! returns an error to the loop.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use hardener_core::{Artifact, AuditResult};

mod command;
mod report;

pub use command::CommandAssessor;
pub use report::{load_seed_report, parse_audit_report, parse_audit_report_str};

/// Wall-clock bound on one assessor call. Not configurable.
pub const ASSESSOR_TIMEOUT: Duration = Duration::from_secs(120);

/// Why the assessor could not produce a result.
#[derive(Error, Debug)]
pub enum AssessorFailure {
    #[error("assessor timed out after {0:?}")]
    Timeout(Duration),

    #[error("assessor unavailable: {0}")]
    Unavailable(String),

    #[error("assessor produced no report: {0}")]
    MissingReport(String),

    #[error("assessor output unparsable: {0}")]
    Unparsable(String),

    #[error("assessor I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// The external scorer.
#[async_trait]
pub trait Assessor: Send + Sync {
    /// Score one artifact.
    async fn assess(&self, artifact: &Artifact) -> Result<AuditResult, AssessorFailure>;

    /// Name for logs.
    fn name(&self) -> &str;
}

/// Wraps an [`Assessor`] with the fixed timeout and the downgrade rule.
#[derive(Clone)]
pub struct AssessorAdapter {
    assessor: Arc<dyn Assessor>,
}

impl std::fmt::Debug for AssessorAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessorAdapter")
            .field("assessor", &self.assessor.name())
            .finish()
    }
}

impl AssessorAdapter {
    pub fn new(assessor: Arc<dyn Assessor>) -> Self {
        Self { assessor }
    }

    /// Assess `artifact`. Never fails; failures come back DEGRADED.
    pub async fn assess(&self, artifact: &Artifact) -> AuditResult {
        let outcome =
            match tokio::time::timeout(ASSESSOR_TIMEOUT, self.assessor.assess(artifact)).await {
                Ok(result) => result,
                Err(_) => Err(AssessorFailure::Timeout(ASSESSOR_TIMEOUT)),
            };

        match outcome {
            Ok(result) => {
                tracing::debug!(
                    assessor = self.assessor.name(),
                    version = artifact.version(),
                    score = result.score,
                    findings = result.findings.len(),
                    "Assessment completed"
                );
                result
            }
            Err(failure) => {
                tracing::warn!(
                    assessor = self.assessor.name(),
                    version = artifact.version(),
                    error = %failure,
                    "Assessment degraded"
                );
                AuditResult::degraded(failure.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hardener_core::{validate, Finding, Severity};

    struct SlowAssessor;

    #[async_trait]
    impl Assessor for SlowAssessor {
        async fn assess(&self, _artifact: &Artifact) -> Result<AuditResult, AssessorFailure> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(AuditResult::normal(99, vec![]))
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    struct FixedAssessor(Result<u8, &'static str>);

    #[async_trait]
    impl Assessor for FixedAssessor {
        async fn assess(&self, _artifact: &Artifact) -> Result<AuditResult, AssessorFailure> {
            match self.0 {
                Ok(score) => Ok(AuditResult::normal(
                    score,
                    vec![Finding::new(Severity::Medium, "Missing maxLength", "")],
                )),
                Err(reason) => Err(AssessorFailure::Unavailable(reason.to_string())),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn artifact() -> Artifact {
        validate("openapi: \"3.0.3\"\n").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades() {
        let adapter = AssessorAdapter::new(Arc::new(SlowAssessor));
        let result = adapter.assess(&artifact()).await;

        assert!(result.is_degraded());
        assert_eq!(result.score, 0);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].severity, Severity::Critical);
        assert!(result.findings[0].description.contains("timed out"));
    }

    #[tokio::test]
    async fn test_failure_degrades() {
        let adapter = AssessorAdapter::new(Arc::new(FixedAssessor(Err("42c: not found"))));
        let result = adapter.assess(&artifact()).await;
        assert!(result.is_degraded());
        assert!(result.findings[0].description.contains("42c: not found"));
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let adapter = AssessorAdapter::new(Arc::new(FixedAssessor(Ok(72))));
        let result = adapter.assess(&artifact()).await;
        assert!(!result.is_degraded());
        assert_eq!(result.score, 72);
        assert_eq!(result.findings.len(), 1);
    }
}
