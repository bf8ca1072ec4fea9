//! Agent trait definition.
//!
//! All generation-backed agents (SQL generation, intent parsing,
//! synthesis) implement this trait, which provides a uniform interface
//! plus the model fallback chain: a single logical call is retried
//! across every configured model before failing.

use std::time::Duration;

use async_trait::async_trait;

use super::message::{ChatRequest, system_message, user_message};
use super::provider::LlmProvider;
use crate::error::OrchestratorError;

/// Response from an agent execution.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// The agent's text output.
    pub content: String,
    /// Token usage for this call.
    pub usage: super::message::TokenUsage,
    /// Why the model stopped generating (e.g. `"stop"`, `"length"`).
    pub finish_reason: Option<String>,
}

/// Trait implemented by all generation-backed agents in the system.
///
/// Agents encapsulate a specific role (SQL generation for one domain,
/// intent parsing, synthesis) with a fixed system prompt and a shared
/// model fallback chain. [`Agent::execute`] tries each model in order,
/// treating transport errors and empty responses as reasons to fall
/// back, and fails only once the chain is exhausted.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Agent name for logging and identification.
    fn name(&self) -> &'static str;

    /// Model fallback chain, tried in order.
    fn models(&self) -> &[String];

    /// System prompt that defines the agent's role and behavior.
    fn system_prompt(&self) -> &str;

    /// Sampling temperature.
    fn temperature(&self) -> f32 {
        0.1
    }

    /// Maximum tokens for the response.
    fn max_tokens(&self) -> u32 {
        512
    }

    /// Timeout per model attempt.
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// Executes the agent with the given user message.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ModelsExhausted`] when every model
    /// in the chain failed or returned an empty response.
    async fn execute(
        &self,
        provider: &dyn LlmProvider,
        user_msg: &str,
    ) -> Result<AgentResponse, OrchestratorError> {
        let mut last_error = "no models configured".to_string();

        for model in self.models() {
            let request = ChatRequest {
                model: model.clone(),
                messages: vec![system_message(self.system_prompt()), user_message(user_msg)],
                temperature: Some(self.temperature()),
                max_tokens: Some(self.max_tokens()),
            };

            let attempt = tokio::time::timeout(self.timeout(), provider.chat(&request)).await;
            match attempt {
                Ok(Ok(response)) => {
                    if response.content.trim().is_empty() {
                        last_error = format!("model {model} returned an empty response");
                        tracing::warn!(
                            agent = self.name(),
                            model = %model,
                            "empty response, trying next model"
                        );
                        continue;
                    }
                    return Ok(AgentResponse {
                        content: response.content,
                        usage: response.usage,
                        finish_reason: response.finish_reason,
                    });
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                    tracing::warn!(
                        agent = self.name(),
                        model = %model,
                        error = %last_error,
                        "model failed, trying next model"
                    );
                }
                Err(_) => {
                    last_error = format!("model {model} timed out after {:?}", self.timeout());
                    tracing::warn!(
                        agent = self.name(),
                        model = %model,
                        "request timed out, trying next model"
                    );
                }
            }
        }

        Err(OrchestratorError::ModelsExhausted { last_error })
    }
}
