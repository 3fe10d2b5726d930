//! Azure OpenAI chat completions provider.
//!
//! Requests go to a named deployment:
//! `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`
//! with the key in the `api-key` header.

use super::{
    factory::ProviderFactory,
    secrets::{ApiCredential, CredentialBuilder},
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

pub const AZURE_OPENAI_API_KEY_ENV: &str = "AZURE_OPENAI_API_KEY";
pub const AZURE_OPENAI_ENDPOINT_ENV: &str = "AZURE_OPENAI_ENDPOINT";
pub const AZURE_OPENAI_DEPLOYMENT_ENV: &str = "AZURE_OPENAI_DEPLOYMENT";
pub const AZURE_OPENAI_API_VERSION_ENV: &str = "AZURE_OPENAI_API_VERSION";

const DEFAULT_API_VERSION: &str = "2024-10-21";

pub struct AzureOpenAiProvider {
    api_key: ApiCredential,
    endpoint: String,
    deployment: String,
    api_version: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AzureOpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureOpenAiProvider")
            .field("api_key", &self.api_key)
            .field("endpoint", &self.endpoint)
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl AzureOpenAiProvider {
    /// Build from generator options with environment fallbacks.
    ///
    /// Recognized options: `api_key`, `endpoint`, `deployment`, `api_version`.
    pub fn from_config(options: &JsonValue) -> Result<Self, ProviderError> {
        let creds = CredentialBuilder::new()
            .require("api_key", AZURE_OPENAI_API_KEY_ENV, "Azure OpenAI API key")
            .require("endpoint", AZURE_OPENAI_ENDPOINT_ENV, "Azure OpenAI endpoint")
            .require("deployment", AZURE_OPENAI_DEPLOYMENT_ENV, "Azure OpenAI deployment")
            .optional("api_version", AZURE_OPENAI_API_VERSION_ENV, "Azure OpenAI API version")
            .build(options)?;

        let endpoint = creds.get("endpoint")?.expose().trim_end_matches('/').to_string();
        if !endpoint.starts_with("https://") && !endpoint.starts_with("http://") {
            return Err(ProviderError::NotConfigured(
                "Azure OpenAI endpoint must start with https://".to_string(),
            ));
        }

        let api_key = ApiCredential::new(
            creds.get("api_key")?.expose(),
            creds.get("api_key")?.source(),
            "Azure OpenAI API key",
        );

        Ok(Self {
            api_key,
            endpoint,
            deployment: creds.get("deployment")?.expose().to_string(),
            api_version: creds
                .get_optional("api_version")
                .map(|v| v.expose().to_string())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            client: reqwest::Client::new(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint, self.deployment, self.api_version
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: String,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl LlmProvider for AzureOpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = ChatRequest {
            messages: &messages,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };

        let response = self
            .client
            .post(self.url())
            .header("api-key", self.api_key.expose())
            .header("content-type", "application/json")
            .timeout(config.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(config.timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|e| format!("unreadable error body: {}", e));
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::ParseError("response has no choices".to_string()))?;

        let usage = body
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            usage,
            model: if body.model.is_empty() {
                self.deployment.clone()
            } else {
                body.model
            },
            stop_reason: choice.finish_reason,
        })
    }

    async fn health_check(&self) -> bool {
        !self.api_key.is_empty() && !self.deployment.is_empty()
    }

    fn name(&self) -> &str {
        "azure-openai"
    }
}

/// Factory for `provider: azure-openai`.
///
/// ```yaml
/// generator:
///   provider: azure-openai
///   options:
///     endpoint: "https://my-resource.openai.azure.com"
///     deployment: "gpt-4o"
///     # api_key falls back to AZURE_OPENAI_API_KEY
/// ```
pub struct AzureOpenAiProviderFactory;

impl ProviderFactory for AzureOpenAiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "azure-openai"
    }

    fn create(&self, options: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(AzureOpenAiProvider::from_config(options)?))
    }

    fn validate_config(&self, options: &JsonValue) -> Result<(), ProviderError> {
        for (key, env) in [
            ("api_key", AZURE_OPENAI_API_KEY_ENV),
            ("endpoint", AZURE_OPENAI_ENDPOINT_ENV),
            ("deployment", AZURE_OPENAI_DEPLOYMENT_ENV),
        ] {
            if !ApiCredential::is_available(options, key, env) {
                return Err(ProviderError::NotConfigured(format!(
                    "Azure OpenAI '{}' required: set it in options or {} env",
                    key, env
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> JsonValue {
        serde_json::json!({
            "api_key": "azure-secret-key",
            "endpoint": "https://contoso.openai.azure.com/",
            "deployment": "gpt-4o-hardening"
        })
    }

    #[test]
    fn test_deployment_url() {
        let provider = AzureOpenAiProvider::from_config(&options()).unwrap();
        assert_eq!(
            provider.url(),
            "https://contoso.openai.azure.com/openai/deployments/gpt-4o-hardening/chat/completions?api-version=2024-10-21"
        );
    }

    #[test]
    fn test_api_version_override() {
        let mut opts = options();
        opts["api_version"] = serde_json::json!("2025-01-01-preview");
        let provider = AzureOpenAiProvider::from_config(&opts).unwrap();
        assert!(provider.url().ends_with("api-version=2025-01-01-preview"));
    }

    #[test]
    fn test_rejects_endpoint_without_scheme() {
        let mut opts = options();
        opts["endpoint"] = serde_json::json!("contoso.openai.azure.com");
        assert!(AzureOpenAiProvider::from_config(&opts).is_err());
    }

    #[test]
    fn test_key_not_in_debug_output() {
        let provider = AzureOpenAiProvider::from_config(&options()).unwrap();
        let debug = format!("{:?}", provider);
        assert!(!debug.contains("azure-secret-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_response_parsing() {
        let body: ChatResponse = serde_json::from_value(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "openapi: 3.0.3"}, "finish_reason": "stop"}],
            "model": "gpt-4o",
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        }))
        .unwrap();
        assert_eq!(body.choices[0].message.content.as_deref(), Some("openapi: 3.0.3"));
        assert_eq!(body.usage.map(|u| u.completion_tokens), Some(7));
    }
}
