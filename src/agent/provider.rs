//! Pluggable LLM provider trait.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into provider-specific SDK calls. This keeps all agent logic decoupled
//! from any particular LLM vendor; the generated text is always treated
//! as untrusted and sanitized before interpretation.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::OrchestratorError;

/// Trait for LLM provider backends.
///
/// Implementations handle the transport layer (HTTP, SDK calls) for a
/// specific provider while presenting a uniform interface to agents.
/// Model fallback lives above this trait: agents retry a single
/// request across their configured model chain.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openrouter"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] on API failures, timeouts, or
    /// response decoding errors.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, OrchestratorError>;
}
