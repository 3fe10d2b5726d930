//! # hardener-runtime
//!
//! The asynchronous half of the hardener: the external assessor, the
//! correction strategies, the generator providers and the loop that ties
//! them together.
//!
//! Everything deterministic (validation, prioritization, the stop policy,
//! the patch set, session bookkeeping) lives in `hardener-core`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hardener_runtime::{HardenerConfig, Orchestrator};
//!
//! let config = HardenerConfig::from_file("hardener.yaml")?;
//! let orchestrator = Orchestrator::builder().config(config).build().await?;
//!
//! let result = orchestrator.run(&std::fs::read_to_string("openapi.yaml")?).await?;
//! println!("{} after {} iterations", result.outcome(), result.summary.iterations_used);
//! ```
//!
//! ## Providers
//!
//! Generator backends are feature-gated:
//! - `azure-openai`: Azure OpenAI chat completions
//! - `anthropic`: Anthropic messages API
//! - `all-providers`: both

pub mod assessor;
pub mod config;
pub mod corrector;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod usage;

pub use assessor::{
    load_seed_report, parse_audit_report, parse_audit_report_str, Assessor, AssessorAdapter,
    AssessorFailure, CommandAssessor, ASSESSOR_TIMEOUT,
};
pub use config::{
    AssessorConfig, ConfigurationError, CorrectorConfig, CorrectorMode, GeneratorConfig,
    HardenerConfig, LoopConfig, LoopSettings, ReportMode,
};
pub use corrector::{
    CorrectionContext, CorrectionError, Corrected, Corrector, DeterministicStrategy,
    GenerativeStrategy,
};
pub use orchestrator::{
    HardeningResult, Orchestrator, OrchestratorBuilder, OrchestratorError, SessionInputs,
};
pub use providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry, TokenUsage,
};
pub use usage::LlmUsage;
