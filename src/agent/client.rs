//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use crate::agent::config::OrchestratorConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenRouterProvider;
use crate::error::OrchestratorError;

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"openrouter"` (default) — OpenRouter / `OpenAI`-compatible APIs
///   via `async-openai`
///
/// # Errors
///
/// Returns [`OrchestratorError::UnsupportedProvider`] for unknown
/// provider names.
pub fn create_provider(
    config: &OrchestratorConfig,
) -> Result<Box<dyn LlmProvider>, OrchestratorError> {
    match config.provider.as_str() {
        "openrouter" => Ok(Box::new(OpenRouterProvider::new(config))),
        other => Err(OrchestratorError::UnsupportedProvider {
            name: other.to_string(),
        }),
    }
}
