//! # hardener-server
//!
//! HTTP surface for the hardener loop.
//!
//! - `POST /v1/harden` runs one session and returns either the hardened
//!   artifact or a JSON envelope with the analysis report
//! - `GET /health` is a liveness probe
//!
//! Each request builds its own orchestrator from the shared base
//! configuration, so sessions never share state.

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{AnalysisReport, HardenRequest, HardenResponse, ResponseFormat};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use hardener_runtime::{Assessor, HardenerConfig, LlmProvider, OrchestratorBuilder};

/// Request bodies above this size are rejected.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    config: Arc<HardenerConfig>,
    assessor: Option<Arc<dyn Assessor>>,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    /// `config` supplies the assessor and generator sections; the loop and
    /// corrector sections are overridden per request.
    pub fn new(config: HardenerConfig) -> Self {
        Self {
            config: Arc::new(config),
            assessor: None,
            provider: None,
        }
    }

    pub fn with_assessor(mut self, assessor: Arc<dyn Assessor>) -> Self {
        self.assessor = Some(assessor);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &HardenerConfig {
        &self.config
    }

    fn orchestrator_builder(&self, config: HardenerConfig) -> OrchestratorBuilder {
        let mut builder = OrchestratorBuilder::new().config(config);
        if let Some(assessor) = &self.assessor {
            builder = builder.assessor(Arc::clone(assessor));
        }
        if let Some(provider) = &self.provider {
            builder = builder.provider(Arc::clone(provider));
        }
        builder
    }
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/harden", post(handlers::harden))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Hardener server listening");
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use hardener_core::{Artifact, AuditResult, Finding, Severity};
    use hardener_runtime::AssessorFailure;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ARTIFACT: &str = "openapi: \"3.0.3\"\ninfo:\n  title: Orders\n  version: \"1.0.0\"\npaths: {}\n";

    /// Scores 40 for the input, 90 for anything corrected.
    struct StepAssessor;

    #[async_trait]
    impl Assessor for StepAssessor {
        async fn assess(&self, artifact: &Artifact) -> Result<AuditResult, AssessorFailure> {
            Ok(if artifact.version() == 0 {
                AuditResult::normal(40, vec![Finding::new(Severity::Critical, "No auth", "")])
            } else {
                AuditResult::normal(90, vec![])
            })
        }

        fn name(&self) -> &str {
            "step"
        }
    }

    fn app() -> Router {
        router(AppState::new(HardenerConfig::default()).with_assessor(Arc::new(StepAssessor)))
    }

    fn post(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/harden")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        response.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_json_envelope() {
        let request = json!({
            "format": "json",
            "use_generative_service": false,
            "artifact_text": ARTIFACT,
            "target_score": 80
        });

        let response = app().oneshot(post(request.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["iterations_used"], 2);
        assert_eq!(body["final_score"], 90);
        assert_eq!(body["analysis_report"]["summary"]["outcome"], "TARGET_ACHIEVED");
        assert_eq!(body["analysis_report"]["session"]["history"].as_array().unwrap().len(), 2);
        assert!(body["artifact"].as_str().unwrap().contains("securitySchemes"));
        assert!(body["improvements_made"]
            .as_array()
            .unwrap()
            .contains(&json!("Score improved by 50 points")));
    }

    #[tokio::test]
    async fn test_yaml_response() {
        let request = json!({
            "format": "yaml",
            "use_generative_service": false,
            "artifact_text": ARTIFACT,
            "max_iterations": 1,
            "target_score": 80
        });

        let response = app().oneshot(post(request.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/yaml"
        );

        // Budget of one: the input comes back unchanged.
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        let returned: Value = serde_yaml::from_str::<Value>(&text).unwrap();
        assert_eq!(returned["info"]["title"], "Orders");
        assert!(returned.get("components").is_none());
    }

    #[tokio::test]
    async fn test_missing_target_score_is_400() {
        let request = json!({
            "format": "json",
            "use_generative_service": false,
            "artifact_text": ARTIFACT
        });

        let response = app().oneshot(post(request.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_out_of_range_target_is_400() {
        let request = json!({
            "format": "json",
            "use_generative_service": false,
            "artifact_text": ARTIFACT,
            "target_score": 150
        });

        let response = app().oneshot(post(request.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("150"));
    }

    #[tokio::test]
    async fn test_invalid_artifact_is_400() {
        let request = json!({
            "format": "json",
            "use_generative_service": false,
            "artifact_text": "paths: [",
            "target_score": 80
        });

        let response = app().oneshot(post(request.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let response = app().oneshot(post("{not json".to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let request = json!({
            "format": "pdf",
            "use_generative_service": false,
            "artifact_text": ARTIFACT,
            "target_score": 80
        });
        let response = app().oneshot(post(request.to_string())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"status": "ok"}));
    }
}
