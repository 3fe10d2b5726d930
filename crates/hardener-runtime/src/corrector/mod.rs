//! Corrector: produces the next artifact version from an assessment.
//!
//! Two strategies behind one tagged variant:
//! - [`GenerativeStrategy`] asks the generator for a rewrite (one call, no retry)
//! - [`DeterministicStrategy`] applies the local patch set
//!
//! Both return a validated artifact or a [`CorrectionError`].

use std::time::Duration;
use thiserror::Error;

use hardener_core::{
    Artifact, DeterministicPatcher, Finding, PrioritizedFindings, StrategyKind, ValidationError,
};

use crate::providers::{ProviderError, TokenUsage};

mod generative;

pub use generative::GenerativeStrategy;

/// Why a correction produced no artifact.
#[derive(Error, Debug)]
pub enum CorrectionError {
    #[error("corrected artifact is invalid: {0}")]
    InvalidArtifact(#[from] ValidationError),

    #[error("generator call failed: {0}")]
    GeneratorFailed(ProviderError),

    #[error("generator timed out after {0:?}")]
    GeneratorTimeout(Duration),
}

/// Per-iteration context that shapes the correction.
#[derive(Debug, Clone, Copy)]
pub struct CorrectionContext<'a> {
    pub current_score: u8,
    pub target_score: u8,
    /// Lint findings; only the generative strategy uses them
    pub lint_findings: &'a [Finding],
}

/// A successful correction.
#[derive(Debug, Clone)]
pub struct Corrected {
    pub artifact: Artifact,
    pub strategy: StrategyKind,
    /// Token usage and model when the generator was called
    pub usage: Option<(TokenUsage, String)>,
}

/// Local, rule-based strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicStrategy {
    patcher: DeterministicPatcher,
}

impl DeterministicStrategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn correct(&self, artifact: &Artifact) -> Result<Corrected, CorrectionError> {
        let patched = self.patcher.apply(artifact)?;
        if patched.content_eq(artifact) {
            tracing::debug!(version = artifact.version(), "Patch set already fully applied");
        }
        Ok(Corrected {
            artifact: patched,
            strategy: StrategyKind::Deterministic,
            usage: None,
        })
    }
}

/// The correction capability used by the orchestrator.
#[derive(Debug)]
pub enum Corrector {
    Generative(GenerativeStrategy),
    Deterministic(DeterministicStrategy),
}

impl Corrector {
    pub fn kind(&self) -> StrategyKind {
        match self {
            Corrector::Generative(_) => StrategyKind::Generative,
            Corrector::Deterministic(_) => StrategyKind::Deterministic,
        }
    }

    /// Produce the next artifact version.
    ///
    /// `attempt` is the number of corrections already made in this session.
    pub async fn correct(
        &self,
        artifact: &Artifact,
        findings: &PrioritizedFindings,
        attempt: u32,
        context: &CorrectionContext<'_>,
    ) -> Result<Corrected, CorrectionError> {
        match self {
            Corrector::Generative(strategy) => {
                strategy.correct(artifact, findings, attempt, context).await
            }
            Corrector::Deterministic(strategy) => strategy.correct(artifact),
        }
    }
}
