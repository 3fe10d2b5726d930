//! # hardener-core
//!
//! Deterministic building blocks for iterative OpenAPI hardening.
//!
//! This crate holds everything in the assess-correct-converge loop that does
//! not talk to the outside world:
//! - the artifact validator and versioned `Artifact` snapshots
//! - the issue prioritizer and convergence policy
//! - the deterministic correction strategy
//! - the session history and its report aggregator
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same input always produces same output
//! 2. **No I/O**: No network calls, no subprocesses
//! 3. **Always valid**: Every `Artifact` passed structural validation
//!
//! ## Example
//!
//! ```rust,ignore
//! use hardener_core::{decide, prioritize, validate, DeterministicPatcher};
//!
//! let artifact = validate(&std::fs::read_to_string("openapi.yaml")?)?;
//! let patched = DeterministicPatcher::new().apply(&artifact)?;
//! assert_eq!(patched.version(), artifact.version() + 1);
//! ```

pub mod artifact;
pub mod lint;
pub mod patches;
pub mod policy;
pub mod prioritizer;
pub mod report;
pub mod session;
pub mod types;

// Re-export main types at crate root
pub use artifact::{strip_code_fences, validate, Artifact, ValidationError};
pub use lint::{parse_lint_report, parse_lint_report_str};
pub use patches::DeterministicPatcher;
pub use policy::{decide, Decision};
pub use prioritizer::{prioritize, PrioritizedFindings};
pub use report::{summarize, SessionSummary};
pub use session::{ActiveSession, IterationRecord, Session, SessionError};
pub use types::{AuditOrigin, AuditResult, Finding, Outcome, Severity, StrategyKind};
