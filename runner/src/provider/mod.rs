//! Model provider clients.
//!
//! A [`Provider`] turns one prompt into response text or a classified
//! [`ProviderFailure`]. Concrete clients talk to OpenRouter
//! ([`OpenRouterProvider`]) and the Gemini API ([`GeminiProvider`]);
//! [`RetryingProvider`] wraps any of them with a bounded retry policy and
//! [`ScriptedProvider`] replays canned outcomes without network access.

mod classify;
mod gemini;
mod openrouter;
mod retry;
mod scripted;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prompt_harness_core::{ModelId, ProviderErrorKind};
use prompt_harness_db::{ProviderConfig, ProvidersConfig, RetryConfig};
use thiserror::Error;

pub use classify::{classify_status, classify_transport};
pub use gemini::GeminiProvider;
pub use openrouter::OpenRouterProvider;
pub use retry::{RetryPolicy, RetryingProvider};
pub use scripted::ScriptedProvider;

use crate::error::RunnerError;

/// Text returned by a successful provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub text: String,
}

impl ProviderReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Classified provider failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {detail}")]
pub struct ProviderFailure {
    pub kind: ProviderErrorKind,
    pub detail: String,
}

impl ProviderFailure {
    pub fn new(kind: ProviderErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn auth(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::AuthError, detail)
    }

    pub fn server(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ProviderServerError, detail)
    }
}

/// Outcome of one provider call.
pub type ProviderOutcome = Result<ProviderReply, ProviderFailure>;

/// A model backend that completes prompts.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Sends `prompt` and returns the model's text.
    async fn complete(&self, prompt: &str) -> ProviderOutcome;
}

/// One provider per supported model.
#[derive(Clone)]
pub struct ProviderSet {
    qwen: Arc<dyn Provider>,
    gemini: Arc<dyn Provider>,
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("qwen", &self.qwen.name())
            .field("gemini", &self.gemini.name())
            .finish()
    }
}

impl ProviderSet {
    pub fn new(qwen: Arc<dyn Provider>, gemini: Arc<dyn Provider>) -> Self {
        Self { qwen, gemini }
    }

    /// Uses the same provider for every model.
    pub fn uniform(provider: Arc<dyn Provider>) -> Self {
        Self {
            qwen: Arc::clone(&provider),
            gemini: provider,
        }
    }

    /// Builds HTTP clients for both models, each wrapped in the retry
    /// policy. API keys are read from the environment now; a missing key
    /// surfaces as an `AuthError` on the first call.
    pub fn from_config(
        providers: &ProvidersConfig,
        retry: &RetryConfig,
    ) -> Result<Self, RunnerError> {
        let policy = RetryPolicy::from(retry);
        let qwen = OpenRouterProvider::from_config(&providers.qwen)?;
        let gemini = GeminiProvider::from_config(&providers.gemini)?;
        Ok(Self {
            qwen: Arc::new(RetryingProvider::new(qwen, policy)),
            gemini: Arc::new(RetryingProvider::new(gemini, policy)),
        })
    }

    pub fn get(&self, model: ModelId) -> &Arc<dyn Provider> {
        match model {
            ModelId::Qwen => &self.qwen,
            ModelId::Gemini => &self.gemini,
        }
    }
}

fn http_client(config: &ProviderConfig) -> Result<reqwest::Client, RunnerError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("prompt-harness/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(RunnerError::HttpClient)
}

fn missing_key(config: &ProviderConfig) -> ProviderFailure {
    ProviderFailure::auth(format!(
        "API key not configured; set {}",
        config.api_key_env
    ))
}
