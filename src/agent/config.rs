//! Orchestrator configuration with builder pattern and environment
//! variable support.
//!
//! Configuration is resolved in order: explicit values → environment
//! variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::OrchestratorError;

/// Default request timeout per model attempt in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default maximum completion tokens per generation call.
const DEFAULT_MAX_TOKENS: u32 = 512;
/// Default sampling temperature.
const DEFAULT_TEMPERATURE: f32 = 0.1;
/// Default attempts per clarifying question before a field is skipped.
const DEFAULT_COLLECT_ATTEMPTS: u32 = 3;
/// Default directory holding the four domain database files.
const DEFAULT_DB_DIR: &str = "db";

/// Default model fallback chain (OpenRouter slugs, tried in order).
const DEFAULT_MODELS: [&str; 5] = [
    "xiaomi/mimo-v2-flash:free",
    "mistralai/devstral-2512:free",
    "tngtech/deepseek-r1t2-chimera:free",
    "tngtech/deepseek-r1t-chimera:free",
    "deepseek/deepseek-r1-0528:free",
];

/// Default OpenRouter API base URL.
const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Configuration for the orchestration pipeline.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// LLM provider name (e.g., "openrouter").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// API base URL.
    pub base_url: String,
    /// Model fallback chain, tried in order until one succeeds.
    pub models: Vec<String>,
    /// Sampling temperature for all generation calls.
    pub temperature: f32,
    /// Maximum completion tokens per generation call.
    pub max_tokens: u32,
    /// Request timeout per model attempt.
    pub timeout: Duration,
    /// Attempts per clarifying question before the field is skipped.
    pub collect_attempts: u32,
    /// Directory holding the four domain database files.
    pub db_dir: PathBuf,
    /// Directory for JSONL audit logs, when audit is enabled.
    pub log_dir: Option<PathBuf>,
}

impl OrchestratorConfig {
    /// Creates a new builder for `OrchestratorConfig`.
    #[must_use]
    pub fn builder() -> OrchestratorConfigBuilder {
        OrchestratorConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, OrchestratorError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`OrchestratorConfig`].
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    models: Option<Vec<String>>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
    collect_attempts: Option<u32>,
    db_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
}

impl OrchestratorConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENROUTER_API_KEY")
                .or_else(|_| std::env::var("OMNI_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OMNI_BASE_URL").ok();
        }
        if self.models.is_none() {
            self.models = std::env::var("OMNI_MODELS").ok().map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            });
        }
        if self.db_dir.is_none() {
            self.db_dir = std::env::var("OMNI_DB_DIR").ok().map(PathBuf::from);
        }
        if self.log_dir.is_none() {
            self.log_dir = std::env::var("OMNI_LOG_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model fallback chain.
    #[must_use]
    pub fn models(mut self, models: Vec<String>) -> Self {
        self.models = Some(models);
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, t: f32) -> Self {
        self.temperature = Some(t);
        self
    }

    /// Sets the maximum completion tokens.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the request timeout per model attempt.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the attempts per clarifying question.
    #[must_use]
    pub const fn collect_attempts(mut self, n: u32) -> Self {
        self.collect_attempts = Some(n);
        self
    }

    /// Sets the domain database directory.
    #[must_use]
    pub fn db_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.db_dir = Some(dir.into());
        self
    }

    /// Sets the audit log directory.
    #[must_use]
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Builds the [`OrchestratorConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<OrchestratorConfig, OrchestratorError> {
        let api_key = self.api_key.ok_or(OrchestratorError::ApiKeyMissing)?;

        let models = match self.models {
            Some(models) if !models.is_empty() => models,
            _ => DEFAULT_MODELS.iter().map(ToString::to_string).collect(),
        };

        Ok(OrchestratorConfig {
            provider: self.provider.unwrap_or_else(|| "openrouter".to_string()),
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            models,
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            collect_attempts: self.collect_attempts.unwrap_or(DEFAULT_COLLECT_ATTEMPTS),
            db_dir: self.db_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DB_DIR)),
            log_dir: self.log_dir,
        })
    }
}
