use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Provider, ProviderOutcome};

/// Replays canned outcomes in order, repeating the last one once the
/// script runs out. Useful for offline runs and tests.
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderOutcome>>,
    last: Mutex<Option<ProviderOutcome>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(outcomes: Vec<ProviderOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns `outcome` on every call.
    pub fn always(outcome: ProviderOutcome) -> Self {
        Self::new(vec![outcome])
    }

    /// Waits `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> ProviderOutcome {
        let mut script = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(outcome) = script.pop_front() {
            *last = Some(outcome.clone());
            return outcome;
        }
        last.clone()
            .unwrap_or_else(|| Err(super::ProviderFailure::server("script is empty")))
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _prompt: &str) -> ProviderOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.next_outcome()
    }
}
