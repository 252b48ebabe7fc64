//! Prompt test execution.
//!
//! This crate sends assembled TAM and DCF prompts to model providers and
//! turns each reply into a scored, stored [`TestResult`](prompt_harness_core::TestResult):
//!
//! - [`provider`]: OpenRouter and Gemini clients, status classification and
//!   retries.
//! - [`prompt`]: preamble, company context and framework assembly.
//! - [`assembler`]: one test end to end under a per-profile deadline.
//! - [`batch`]: sequential runs over a list of company contexts.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use prompt_harness_core::{AnalysisKind, AnalysisRequest, ModelId};
//! use prompt_harness_db::{HarnessConfig, ResultStore};
//! use prompt_harness_runner::{ProviderSet, ResultAssembler};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarnessConfig::default();
//! let providers = ProviderSet::from_config(&config.providers, &config.retry)?;
//! let store = Arc::new(ResultStore::in_memory());
//! let assembler = ResultAssembler::from_config(&config, providers, store)?;
//!
//! let request = AnalysisRequest::new("A fintech startup", ModelId::Qwen, AnalysisKind::Tam)?;
//! let result = assembler.run(request).await;
//! println!("{} scored {:.2}", result.test_id, result.quality_score());
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod batch;
mod error;
pub mod prompt;
pub mod provider;

pub use assembler::{ProfileRuntime, ResultAssembler, response_digest};
pub use batch::{BatchOptions, BatchReport, DEFAULT_TEST_COMPANIES, run_batch};
pub use error::RunnerError;
pub use prompt::PromptBuilder;
pub use provider::{
    Provider, ProviderFailure, ProviderOutcome, ProviderReply, ProviderSet, RetryPolicy,
    ScriptedProvider,
};
