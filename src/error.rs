//! Error types for the orchestration pipeline.
//!
//! Errors crossing the Execution Engine boundary are carried as data
//! inside [`AgentResult`](crate::agent::report::AgentResult) rather than
//! propagated; this enum covers the layers beneath that boundary
//! (provider transport, storage, configuration).

use thiserror::Error;

/// Errors produced by the orchestrator and its collaborators.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// No API key was configured for the LLM provider.
    #[error(
        "No API key configured. Set OPENROUTER_API_KEY (or OMNI_API_KEY) \
         or pass one explicitly."
    )]
    ApiKeyMissing,

    /// An unknown provider name was requested.
    #[error("Unsupported provider: {name}")]
    UnsupportedProvider {
        /// The provider name that failed to resolve.
        name: String,
    },

    /// An API request to the LLM provider failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Provider error detail.
        message: String,
        /// HTTP status code, when one was received.
        status: Option<u16>,
    },

    /// Every model in the fallback chain failed for a single request.
    #[error("All models in the fallback chain failed; last error: {last_error}")]
    ModelsExhausted {
        /// Error from the final model attempted.
        last_error: String,
    },

    /// The provider's response could not be interpreted.
    #[error("Failed to parse provider response: {message}")]
    ResponseParse {
        /// Parse failure detail.
        message: String,
        /// The raw response content, preserved for diagnostics.
        content: String,
    },

    /// A domain store operation failed.
    #[error("Store error: {message}")]
    Store {
        /// Underlying store error detail.
        message: String,
    },

    /// A pipeline-level invariant was violated.
    #[error("Orchestration error: {message}")]
    Orchestration {
        /// What went wrong.
        message: String,
    },

    /// An I/O error from the audit sink or input channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for OrchestratorError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Store {
            message: e.to_string(),
        }
    }
}
