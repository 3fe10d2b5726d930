//! Generative strategy: one generator call per correction.

use std::sync::Arc;

use hardener_core::{strip_code_fences, Artifact, PrioritizedFindings, StrategyKind};

use super::{CorrectionContext, CorrectionError, Corrected};
use crate::prompts::{build_instruction, InstructionInput};
use crate::providers::{CompletionConfig, LlmProvider, ProviderError};

pub struct GenerativeStrategy {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl std::fmt::Debug for GenerativeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeStrategy")
            .field("provider", &self.provider.name())
            .field("completion", &self.completion)
            .finish()
    }
}

impl GenerativeStrategy {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub(super) async fn correct(
        &self,
        artifact: &Artifact,
        findings: &PrioritizedFindings,
        attempt: u32,
        context: &CorrectionContext<'_>,
    ) -> Result<Corrected, CorrectionError> {
        let messages = build_instruction(&InstructionInput {
            artifact,
            findings,
            lint_findings: context.lint_findings,
            current_score: context.current_score,
            target_score: context.target_score,
            attempt,
        });

        let prompt_tokens: u32 = messages
            .iter()
            .map(|m| self.provider.estimate_tokens(&m.content))
            .sum();
        tracing::debug!(
            provider = self.provider.name(),
            attempt,
            findings = findings.len(),
            estimated_prompt_tokens = prompt_tokens,
            "Requesting generative correction"
        );

        let timeout = self.completion.timeout;
        let response =
            match tokio::time::timeout(timeout, self.provider.complete(messages, &self.completion))
                .await
            {
                Err(_) => return Err(CorrectionError::GeneratorTimeout(timeout)),
                Ok(Err(ProviderError::Timeout(elapsed))) => {
                    return Err(CorrectionError::GeneratorTimeout(elapsed))
                }
                Ok(Err(e)) => return Err(CorrectionError::GeneratorFailed(e)),
                Ok(Ok(response)) => response,
            };

        let text = strip_code_fences(&response.content);
        let revised = artifact.revise(&text)?;

        Ok(Corrected {
            artifact: revised,
            strategy: StrategyKind::Generative,
            usage: Some((response.usage, response.model)),
        })
    }
}
