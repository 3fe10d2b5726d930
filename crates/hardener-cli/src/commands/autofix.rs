use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use hardener_core::{parse_lint_report_str, Finding, Outcome};
use hardener_runtime::{load_seed_report, CorrectorMode, Orchestrator, SessionInputs};

#[derive(Args, Debug)]
pub struct AutofixArgs {
    /// OpenAPI document to harden
    pub artifact_path: PathBuf,

    /// Existing assessor report, used as the first assessment when present
    #[arg(default_value = "security/out/42c-audit.json")]
    pub assessor_report_path: PathBuf,

    /// Lint report (JSON array of {code, message, path, severity})
    #[arg(default_value = "spectral.json")]
    pub quality_report_path: PathBuf,

    /// Where the hardened document is written
    #[arg(default_value = "openapi.fixed.yaml")]
    pub output_path: PathBuf,

    /// Overrides loop.max_iterations
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Overrides loop.target_score
    #[arg(long)]
    pub target_score: Option<u32>,

    /// Config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides corrector.mode (auto, generative, deterministic)
    #[arg(long)]
    pub corrector: Option<CorrectorMode>,

    /// Exit non-zero when the target is not reached
    #[arg(long)]
    pub fail_on_miss: bool,
}

/// Process exit status for a finished session.
pub fn exit_code(outcome: Outcome, fail_on_miss: bool) -> u8 {
    match (outcome, fail_on_miss) {
        (_, false) | (Outcome::TargetAchieved, true) => 0,
        (Outcome::BudgetExhausted, true) => 2,
        (Outcome::CorrectionFailed, true) => 3,
    }
}

fn load_lint_findings(path: &Path) -> Vec<Finding> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let findings = parse_lint_report_str(&text);
            tracing::debug!(path = %path.display(), findings = findings.len(), "Loaded lint report");
            findings
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "No lint report");
            Vec::new()
        }
    }
}

pub async fn run(args: AutofixArgs) -> Result<ExitCode> {
    let mut config = super::load_config(args.config.as_deref())?;
    if let Some(target) = args.target_score {
        config.convergence.target_score = Some(target);
    }
    if let Some(max) = args.max_iterations {
        config.convergence.max_iterations = max;
    }
    if let Some(mode) = args.corrector {
        config.corrector.mode = mode;
    }

    let artifact_text = std::fs::read_to_string(&args.artifact_path)
        .with_context(|| format!("reading artifact {}", args.artifact_path.display()))?;

    let inputs = SessionInputs {
        seed_assessment: load_seed_report(&args.assessor_report_path),
        lint_findings: load_lint_findings(&args.quality_report_path),
    };

    let orchestrator = Orchestrator::builder().config(config).build().await?;
    let result = orchestrator.run_with(&artifact_text, inputs).await?;

    std::fs::write(&args.output_path, result.artifact.text())
        .with_context(|| format!("writing {}", args.output_path.display()))?;

    let summary = &result.summary;
    tracing::info!(
        outcome = %summary.outcome,
        score = summary.final_score,
        iterations = summary.iterations_used,
        output = %args.output_path.display(),
        "Autofix finished"
    );

    println!(
        "{}: score {} -> {} in {} iteration(s)",
        summary.outcome, summary.initial_score, summary.final_score, summary.iterations_used
    );
    for line in &summary.improvements {
        println!("  - {}", line);
    }
    if result.llm_usage.llm_calls > 0 {
        println!(
            "  generator: {} call(s), {} tokens, ~${:.4}",
            result.llm_usage.llm_calls,
            result.llm_usage.total_tokens,
            result.llm_usage.estimated_cost
        );
    }

    Ok(ExitCode::from(exit_code(summary.outcome, args.fail_on_miss)))
}
