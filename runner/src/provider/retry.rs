use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use prompt_harness_db::RetryConfig;
use tracing::{info, warn};

use super::{Provider, ProviderOutcome};

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero behaves like one.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Wraps a provider and retries every failure except `AuthError`.
pub struct RetryingProvider {
    inner: Arc<dyn Provider>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: impl Provider + 'static, policy: RetryPolicy) -> Self {
        Self::from_arc(Arc::new(inner), policy)
    }

    pub fn from_arc(inner: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl Provider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(&self, prompt: &str) -> ProviderOutcome {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.complete(prompt).await {
                Ok(reply) => {
                    if attempt > 1 {
                        info!(provider = self.inner.name(), attempt, "Provider call recovered");
                    }
                    return Ok(reply);
                }
                Err(failure) if failure.kind.is_retryable() && attempt < attempts => {
                    warn!(
                        provider = self.inner.name(),
                        attempt,
                        kind = %failure.kind,
                        detail = %failure.detail,
                        "Provider call failed, retrying"
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure),
            }
        }
    }
}
