//! Response synthesis: per-domain results to one conversational answer.
//!
//! Builds a textual context block from the aggregated results and asks
//! the model for a grounded, conversational response. Generation
//! problems are never surfaced as errors: the caller always gets a
//! non-empty sentence.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use super::config::OrchestratorConfig;
use super::prompt::{SYNTHESIS_SYSTEM_PROMPT, build_synthesis_prompt};
use super::provider::LlmProvider;
use super::report::AgentResult;
use super::traits::Agent;
use crate::core::DomainName;

/// Fallback when no domain produced any result at all.
const NO_RESULTS_FALLBACK: &str = "I apologize, but I encountered an issue processing \
    your query. Please try rephrasing your question.";

/// Fallback when generation succeeded but produced nothing.
const EMPTY_GENERATION_FALLBACK: &str = "I found the information, but I'm having trouble \
    formulating a response. Please try rephrasing your question.";

/// Fallback when generation itself failed.
const GENERATION_ERROR_FALLBACK: &str = "I apologize, but I encountered an error while \
    generating a response. Please try again or rephrase your question.";

struct SynthesisAgent {
    models: Vec<String>,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

#[async_trait]
impl Agent for SynthesisAgent {
    fn name(&self) -> &'static str {
        "synthesizer"
    }

    fn models(&self) -> &[String] {
        &self.models
    }

    fn system_prompt(&self) -> &str {
        SYNTHESIS_SYSTEM_PROMPT
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Converts aggregated per-domain results into one natural-language
/// answer, with deterministic fallback text when generation fails or
/// yields nothing.
pub struct ResponseSynthesizer {
    agent: SynthesisAgent,
}

impl ResponseSynthesizer {
    /// Creates a synthesizer from orchestrator configuration.
    #[must_use]
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            agent: SynthesisAgent {
                models: config.models.clone(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                timeout: config.timeout,
            },
        }
    }

    /// Synthesizes the final response. Always returns a non-empty
    /// string.
    pub async fn synthesize(
        &self,
        provider: &dyn LlmProvider,
        results: &BTreeMap<DomainName, AgentResult>,
        original_query: &str,
    ) -> String {
        if results.is_empty() {
            return NO_RESULTS_FALLBACK.to_string();
        }

        let user_msg = build_synthesis_prompt(original_query, results);
        match self.agent.execute(provider, &user_msg).await {
            Ok(response) => {
                let text = response.content.trim().to_string();
                if text.is_empty() {
                    EMPTY_GENERATION_FALLBACK.to_string()
                } else {
                    text
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "response synthesis failed");
                GENERATION_ERROR_FALLBACK.to_string()
            }
        }
    }
}

impl std::fmt::Debug for ResponseSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseSynthesizer").finish_non_exhaustive()
    }
}
