//! Request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use hardener_core::{Session, SessionSummary};
use hardener_runtime::config::DEFAULT_MAX_ITERATIONS;
use hardener_runtime::{CorrectorMode, HardeningResult, LlmUsage};

use crate::error::ApiError;
use crate::AppState;

/// Shape of a successful `/v1/harden` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// The JSON envelope
    Json,
    /// The bare artifact as `application/yaml`
    Yaml,
}

/// `POST /v1/harden` body.
#[derive(Debug, Clone, Deserialize)]
pub struct HardenRequest {
    pub format: ResponseFormat,

    /// `true` selects `auto` correction, `false` deterministic
    pub use_generative_service: bool,

    pub artifact_text: String,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    pub target_score: u32,
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub summary: SessionSummary,
    pub session: Session,
    pub llm_usage: LlmUsage,
}

/// JSON envelope returned for `format = "json"`.
#[derive(Debug, Serialize)]
pub struct HardenResponse {
    pub artifact: String,
    pub analysis_report: AnalysisReport,
    pub iterations_used: u32,
    pub final_score: u8,
    pub improvements_made: Vec<String>,
}

impl From<HardeningResult> for HardenResponse {
    fn from(result: HardeningResult) -> Self {
        Self {
            artifact: result.artifact.text().to_string(),
            iterations_used: result.summary.iterations_used,
            final_score: result.summary.final_score,
            improvements_made: result.summary.improvements.clone(),
            analysis_report: AnalysisReport {
                summary: result.summary,
                session: result.session,
                llm_usage: result.llm_usage,
            },
        }
    }
}

/// `POST /v1/harden`
pub async fn harden(
    State(state): State<AppState>,
    payload: Result<Json<HardenRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let mut config = state.config().clone();
    config.convergence.target_score = Some(request.target_score);
    config.convergence.max_iterations = request.max_iterations;
    config.corrector.mode = if request.use_generative_service {
        CorrectorMode::Auto
    } else {
        CorrectorMode::Deterministic
    };

    let orchestrator = state.orchestrator_builder(config).build().await?;
    let result = orchestrator.run(&request.artifact_text).await?;

    tracing::info!(
        outcome = %result.outcome(),
        score = result.final_score(),
        iterations = result.summary.iterations_used,
        "Harden request completed"
    );

    Ok(match request.format {
        ResponseFormat::Yaml => (
            [(header::CONTENT_TYPE, "application/yaml")],
            result.artifact.text().to_string(),
        )
            .into_response(),
        ResponseFormat::Json => Json(HardenResponse::from(result)).into_response(),
    })
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
