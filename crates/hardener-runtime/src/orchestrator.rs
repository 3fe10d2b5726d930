//! The assess-correct-converge loop.
//!
//! ```text
//! INIT (validate) -> ASSESSING -> DECIDING -+-> DONE
//!                       ^                   |
//!                       +--- CORRECTING <---+ (CONTINUE)
//! ```
//!
//! - An invalid initial artifact aborts before any assessment.
//! - The assessor is entered at most `max_iterations` times.
//! - A failed correction keeps the last recorded artifact and stops with
//!   CORRECTION_FAILED. It is never retried within the iteration.
//! - The returned artifact is always the last one that was assessed.

use std::sync::Arc;
use thiserror::Error;

use hardener_core::{
    decide, prioritize, summarize, validate, ActiveSession, Artifact, AuditResult, Finding,
    IterationRecord, Outcome, Session, SessionError, SessionSummary, StrategyKind,
    ValidationError,
};

use crate::assessor::{Assessor, AssessorAdapter, CommandAssessor};
use crate::config::{ConfigurationError, CorrectorMode, HardenerConfig, LoopSettings};
use crate::corrector::{
    CorrectionContext, Corrector, DeterministicStrategy, GenerativeStrategy,
};
use crate::providers::{CompletionConfig, LlmProvider, ProviderRegistry};
use crate::usage::LlmUsage;

/// Errors that stop a session from producing a result.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("initial artifact is invalid: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("session history violated: {0}")]
    Session(#[from] SessionError),
}

/// Inputs for one session beyond the artifact text.
#[derive(Debug, Clone, Default)]
pub struct SessionInputs {
    /// Used as the first assessment instead of invoking the assessor
    pub seed_assessment: Option<AuditResult>,

    /// Lint findings passed to the generative strategy
    pub lint_findings: Vec<Finding>,
}

/// Everything a concluded session produced.
#[derive(Debug, Clone)]
pub struct HardeningResult {
    pub session: Session,

    /// The last assessed artifact
    pub artifact: Artifact,

    pub summary: SessionSummary,

    pub llm_usage: LlmUsage,
}

impl HardeningResult {
    pub fn outcome(&self) -> Outcome {
        self.session.outcome
    }

    pub fn final_score(&self) -> u8 {
        self.summary.final_score
    }

    /// Artifact of the highest-scoring record; the earliest wins ties.
    pub fn best_artifact(&self) -> &Artifact {
        self.session
            .best_record()
            .and_then(|record| record.artifact.as_ref())
            .unwrap_or(&self.artifact)
    }
}

/// Drives sessions. Holds no per-session state, so one orchestrator can
/// run any number of sessions concurrently.
pub struct Orchestrator {
    assessor: AssessorAdapter,
    corrector: Corrector,
    settings: LoopSettings,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("assessor", &self.assessor)
            .field("corrector", &self.corrector.kind())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    pub fn settings(&self) -> LoopSettings {
        self.settings
    }

    pub fn strategy(&self) -> StrategyKind {
        self.corrector.kind()
    }

    /// Harden `artifact_text` with no seed assessment or lint findings.
    pub async fn run(&self, artifact_text: &str) -> Result<HardeningResult, OrchestratorError> {
        self.run_with(artifact_text, SessionInputs::default()).await
    }

    /// Run one session to its terminal outcome.
    pub async fn run_with(
        &self,
        artifact_text: &str,
        inputs: SessionInputs,
    ) -> Result<HardeningResult, OrchestratorError> {
        let LoopSettings {
            target_score,
            max_iterations,
        } = self.settings;

        let mut artifact = validate(artifact_text)?;
        let mut session = ActiveSession::new(target_score, max_iterations);
        let mut usage = LlmUsage::default();
        let mut seed = inputs.seed_assessment;
        let mut produced_by: Option<StrategyKind> = None;

        tracing::info!(
            target = target_score,
            max_iterations,
            strategy = %self.corrector.kind(),
            "Hardening session started"
        );

        let outcome = loop {
            let index = session.next_index();

            let audit = match seed.take() {
                Some(seeded) => seeded,
                None => self.assessor.assess(&artifact).await,
            };
            let score = audit.score;
            let prioritized = prioritize(&audit.findings);

            session = session.record(IterationRecord::new(
                index,
                artifact.clone(),
                audit,
                produced_by,
            ))?;

            tracing::info!(
                iteration = index,
                version = artifact.version(),
                score,
                target = target_score,
                "Iteration assessed"
            );

            if let Some(outcome) = decide(score, index, max_iterations, target_score).outcome() {
                break outcome;
            }

            let context = CorrectionContext {
                current_score: score,
                target_score,
                lint_findings: &inputs.lint_findings,
            };

            match self
                .corrector
                .correct(&artifact, &prioritized, index, &context)
                .await
            {
                Ok(corrected) => {
                    if let Some((tokens, model)) = &corrected.usage {
                        usage.add(tokens, model);
                    }
                    tracing::debug!(
                        iteration = index,
                        strategy = %corrected.strategy,
                        version = corrected.artifact.version(),
                        "Correction produced"
                    );
                    produced_by = Some(corrected.strategy);
                    artifact = corrected.artifact;
                }
                Err(e) => {
                    tracing::warn!(
                        iteration = index,
                        strategy = %self.corrector.kind(),
                        error = %e,
                        "Correction failed; keeping last valid artifact"
                    );
                    break Outcome::CorrectionFailed;
                }
            }
        };

        let session = session.conclude(outcome);
        let summary = summarize(&session);

        match outcome {
            Outcome::TargetAchieved => tracing::info!(
                outcome = %outcome,
                score = summary.final_score,
                iterations = summary.iterations_used,
                "Hardening session finished"
            ),
            _ => tracing::warn!(
                outcome = %outcome,
                score = summary.final_score,
                target = target_score,
                iterations = summary.iterations_used,
                "Hardening session finished below target"
            ),
        }

        Ok(HardeningResult {
            session,
            artifact,
            summary,
            llm_usage: usage,
        })
    }
}

/// Builder for [`Orchestrator`].
///
/// Defaults: the command assessor from `config.assessor`, and a provider
/// resolved from `config.generator` through [`ProviderRegistry::with_defaults`].
pub struct OrchestratorBuilder {
    config: HardenerConfig,
    assessor: Option<Arc<dyn Assessor>>,
    provider: Option<Arc<dyn LlmProvider>>,
    registry: Option<ProviderRegistry>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: HardenerConfig::default(),
            assessor: None,
            provider: None,
            registry: None,
        }
    }

    pub fn config(mut self, config: HardenerConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this assessor instead of the configured command.
    pub fn assessor(mut self, assessor: Arc<dyn Assessor>) -> Self {
        self.assessor = Some(assessor);
        self
    }

    /// Use this provider instead of resolving `config.generator`.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Resolve `config.generator` against this registry.
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    fn completion_config(&self) -> CompletionConfig {
        match &self.config.generator {
            Some(generator) => CompletionConfig {
                model: None,
                max_tokens: generator.max_tokens,
                temperature: generator.temperature,
                timeout: generator.timeout,
            },
            None => CompletionConfig::default(),
        }
    }

    fn resolve_provider(&mut self) -> Result<Arc<dyn LlmProvider>, ConfigurationError> {
        if let Some(provider) = self.provider.take() {
            return Ok(provider);
        }

        let generator = self.config.generator.as_ref().ok_or_else(|| {
            ConfigurationError::GeneratorRequired("no generator section configured".to_string())
        })?;

        let registry = self.registry.take().unwrap_or_else(ProviderRegistry::with_defaults);
        if !registry.has_provider(&generator.provider) {
            return Err(ConfigurationError::UnknownProvider {
                provider: generator.provider.clone(),
                available: registry
                    .available_types()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            });
        }

        registry
            .validate(&generator.provider, &generator.options)
            .map_err(|e| ConfigurationError::InvalidGeneratorOptions(e.to_string()))?;

        registry
            .create(&generator.provider, &generator.options)
            .map_err(|e| ConfigurationError::MissingCredential(e.to_string()))
    }

    async fn generative(&mut self) -> Result<Corrector, ConfigurationError> {
        let provider = self.resolve_provider()?;
        if !provider.health_check().await {
            return Err(ConfigurationError::GeneratorRequired(format!(
                "provider '{}' failed its health check",
                provider.name()
            )));
        }
        Ok(Corrector::Generative(GenerativeStrategy::new(
            provider,
            self.completion_config(),
        )))
    }

    /// Check the configuration and pick the correction strategy.
    pub async fn build(mut self) -> Result<Orchestrator, ConfigurationError> {
        let settings = self.config.loop_settings()?;

        let mode = self.config.corrector.mode;
        let corrector = match mode {
            CorrectorMode::Deterministic => Corrector::Deterministic(DeterministicStrategy::new()),
            CorrectorMode::Generative => self.generative().await?,
            CorrectorMode::Auto => match self.generative().await {
                Ok(corrector) => corrector,
                Err(e) => {
                    tracing::warn!(error = %e, "Generator unavailable, using deterministic correction");
                    Corrector::Deterministic(DeterministicStrategy::new())
                }
            },
        };

        let assessor = self
            .assessor
            .take()
            .unwrap_or_else(|| Arc::new(CommandAssessor::new(self.config.assessor.clone())));

        Ok(Orchestrator {
            assessor: AssessorAdapter::new(assessor),
            corrector,
            settings,
        })
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
