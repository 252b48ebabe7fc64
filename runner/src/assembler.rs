//! Test execution: prompt, provider call, scoring and persistence.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use prompt_harness_core::{AnalysisKind, AnalysisRequest, ProviderErrorKind, RawResponse, TestResult};
use prompt_harness_db::{HarnessConfig, ProfilesConfig, ResultStore};
use prompt_harness_scoring::Scorer;
use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::RunnerError;
use crate::prompt::PromptBuilder;
use crate::provider::{ProviderFailure, ProviderSet};

/// Everything needed to run one analysis kind.
#[derive(Debug, Clone)]
pub struct ProfileRuntime {
    scorer: Arc<Scorer>,
    prompt: PromptBuilder,
    timeout: Duration,
}

impl ProfileRuntime {
    pub fn new(scorer: Scorer, prompt: PromptBuilder, timeout: Duration) -> Self {
        Self {
            scorer: Arc::new(scorer),
            prompt,
            timeout,
        }
    }

    /// Built-in scoring profile and framework with the default deadline.
    pub fn builtin(kind: AnalysisKind) -> Result<Self, RunnerError> {
        let scorer = Scorer::builtin(kind).map_err(|errors| RunnerError::Profile {
            kind: kind.to_string(),
            errors,
        })?;
        let timeout = ProfilesConfig::default().get(kind).request_timeout_secs;
        Ok(Self::new(
            scorer,
            PromptBuilder::new(kind, None),
            Duration::from_secs(timeout),
        ))
    }

    /// Compiles the configured profile for `kind`, reading its framework
    /// file if one is set.
    pub fn from_config(config: &HarnessConfig, kind: AnalysisKind) -> Result<Self, RunnerError> {
        let profile = config.scoring_profile(kind)?;
        let scorer = Scorer::new(profile).map_err(|errors| RunnerError::Profile {
            kind: kind.to_string(),
            errors,
        })?;
        let framework = config.framework_text(kind)?;
        let timeout = config.profiles.get(kind).request_timeout_secs;
        Ok(Self::new(
            scorer,
            PromptBuilder::new(kind, framework),
            Duration::from_secs(timeout),
        ))
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn prompt(&self) -> &PromptBuilder {
        &self.prompt
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Runs prompt tests and records their results.
///
/// [`run`](Self::run) always yields a [`TestResult`]: provider failures and
/// timeouts become zero-score results carrying the error kind.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    providers: ProviderSet,
    tam: ProfileRuntime,
    dcf: ProfileRuntime,
    store: Arc<ResultStore>,
}

impl ResultAssembler {
    /// Uses the built-in profiles.
    pub fn new(providers: ProviderSet, store: Arc<ResultStore>) -> Result<Self, RunnerError> {
        Ok(Self {
            providers,
            tam: ProfileRuntime::builtin(AnalysisKind::Tam)?,
            dcf: ProfileRuntime::builtin(AnalysisKind::Dcf)?,
            store,
        })
    }

    /// Uses the profiles and frameworks from `config`.
    pub fn from_config(
        config: &HarnessConfig,
        providers: ProviderSet,
        store: Arc<ResultStore>,
    ) -> Result<Self, RunnerError> {
        Ok(Self {
            providers,
            tam: ProfileRuntime::from_config(config, AnalysisKind::Tam)?,
            dcf: ProfileRuntime::from_config(config, AnalysisKind::Dcf)?,
            store,
        })
    }

    /// Replaces the runtime for one kind.
    pub fn with_profile(mut self, kind: AnalysisKind, runtime: ProfileRuntime) -> Self {
        match kind {
            AnalysisKind::Tam => self.tam = runtime,
            AnalysisKind::Dcf => self.dcf = runtime,
        }
        self
    }

    pub fn profile(&self, kind: AnalysisKind) -> &ProfileRuntime {
        match kind {
            AnalysisKind::Tam => &self.tam,
            AnalysisKind::Dcf => &self.dcf,
        }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Runs one test end to end and stores the result.
    ///
    /// A store failure is logged and noted in the result's warnings; the
    /// result is still returned.
    pub async fn run(&self, request: AnalysisRequest) -> TestResult {
        let runtime = self.profile(request.kind());
        let provider = self.providers.get(request.model_id());
        let prompt = runtime.prompt.build(request.company_context());

        let started = Instant::now();
        let outcome = match tokio::time::timeout(runtime.timeout, provider.complete(&prompt)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(ProviderFailure::new(
                ProviderErrorKind::Timeout,
                format!("no response within {}s", runtime.timeout.as_secs()),
            )),
        };
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let response = match outcome {
            Ok(reply) => RawResponse::success(reply.text, latency_ms),
            Err(failure) => {
                warn!(
                    provider = provider.name(),
                    model = %request.model_id(),
                    kind = %failure.kind,
                    detail = %failure.detail,
                    "Provider call failed"
                );
                RawResponse::failure(failure.kind, failure.detail, latency_ms)
            }
        };

        let card = runtime.scorer.score(&response.text);
        let warnings = card.warnings();
        let mut result = TestResult {
            test_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            prompt_preview: runtime.prompt.preview(),
            response_digest: response_digest(&response.text),
            metrics: card.metrics,
            validation: card.validation,
            request,
            response,
            warnings,
        };

        info!(
            test_id = %result.test_id,
            kind = %result.kind(),
            model = %result.request.model_id(),
            quality_score = result.quality_score(),
            latency_ms,
            "Test completed"
        );

        // Appends write and flush the log file; keep that off the async workers.
        let store = Arc::clone(&self.store);
        let record = result.clone();
        let stored = tokio::task::spawn_blocking(move || store.append(record))
            .await
            .map_err(|e| format!("store task failed: {e}"))
            .and_then(|appended| appended.map_err(|e| e.to_string()));
        if let Err(err) = stored {
            error!(test_id = %result.test_id, error = %err, "Failed to store test result");
            result
                .warnings
                .push(format!("result was not persisted: {err}"));
        }
        result
    }
}

/// Hex SHA-256 digest of a response text.
pub fn response_digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderReply, ScriptedProvider};
    use prompt_harness_core::{ModelId, QualityTier};

    fn assembler(provider: ScriptedProvider) -> ResultAssembler {
        let providers = ProviderSet::uniform(Arc::new(provider));
        ResultAssembler::new(providers, Arc::new(ResultStore::in_memory())).unwrap()
    }

    fn tam_request() -> AnalysisRequest {
        AnalysisRequest::new(
            "A SaaS company selling project management software to SMBs",
            ModelId::Qwen,
            AnalysisKind::Tam,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_auth_error_yields_zero_score_result() {
        let assembler = assembler(ScriptedProvider::always(Err(ProviderFailure::auth(
            "HTTP 401 Unauthorized",
        ))));

        let result = assembler.run(tam_request()).await;
        assert_eq!(result.provider_error(), Some(ProviderErrorKind::AuthError));
        assert_eq!(result.quality_score(), 0.0);
        assert_eq!(result.validation.quality_tier, QualityTier::Failed);
        assert!(result.response.text.is_empty());
        assert_eq!(result.validation.missing_requirements.len(), 16);
        let stored = assembler.store().get(&result.test_id);
        assert_eq!(stored, Some(result));
    }

    #[tokio::test]
    async fn test_success_is_scored_and_stored() {
        let text = "## Opening Overview\nMarket Size: $10 billion to $20 billion, \
                    central estimate $15 billion (95% confidence interval)";
        let assembler = assembler(ScriptedProvider::always(Ok(ProviderReply::new(text))));

        let result = assembler.run(tam_request()).await;
        assert_eq!(result.provider_error(), None);
        assert_eq!(result.metrics.number("tam_low"), Some(1e10));
        assert_eq!(result.metrics.number("confidence_interval"), Some(0.95));
        assert!(result.quality_score() > 0.0);
        assert_eq!(result.response_digest, response_digest(text));
        assert!(result.prompt_preview.starts_with("## Opening Overview"));
        assert!(Uuid::parse_str(&result.test_id).is_ok());
        assert_eq!(assembler.store().len(), 1);
    }

    #[tokio::test]
    async fn test_deadline_yields_timeout_result() {
        let slow = ScriptedProvider::always(Ok(ProviderReply::new("late")))
            .with_delay(Duration::from_secs(5));
        let assembler = assembler(slow);
        let runtime = assembler
            .profile(AnalysisKind::Tam)
            .clone()
            .with_timeout(Duration::from_millis(20));
        let assembler = assembler.with_profile(AnalysisKind::Tam, runtime);

        let result = assembler.run(tam_request()).await;
        assert_eq!(result.provider_error(), Some(ProviderErrorKind::Timeout));
        assert_eq!(result.quality_score(), 0.0);
    }

    #[tokio::test]
    async fn test_test_ids_are_unique() {
        let assembler = assembler(ScriptedProvider::always(Ok(ProviderReply::new("text"))));
        let first = assembler.run(tam_request()).await;
        let second = assembler.run(tam_request()).await;
        assert_ne!(first.test_id, second.test_id);
        assert_eq!(assembler.store().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_results_reach_the_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let store = Arc::new(ResultStore::open(&path).unwrap());
        let providers = ProviderSet::uniform(Arc::new(ScriptedProvider::always(Ok(
            ProviderReply::new("text"),
        ))));
        let assembler = ResultAssembler::new(providers, store).unwrap();

        let result = assembler.run(tam_request()).await;
        assert!(result.warnings.iter().all(|w| !w.contains("not persisted")));

        let log = std::fs::read_to_string(&path).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains(&result.test_id));
        assert_eq!(ResultStore::open(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_response_digest_is_sha256_hex() {
        assert_eq!(
            response_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
