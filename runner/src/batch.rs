//! Sequential batch runs over a list of company contexts.

use std::time::Duration;

use prompt_harness_core::{AnalysisKind, AnalysisRequest, ModelId, TestResult};
use prompt_harness_scoring::BatchSummary;
use serde::Serialize;
use tracing::{info, warn};

use crate::assembler::ResultAssembler;

/// Company contexts used when a batch run names none.
pub const DEFAULT_TEST_COMPANIES: [&str; 8] = [
    "A SaaS company offering project management software to small and medium businesses",
    "A fintech startup building a digital-only bank for millennials",
    "An AI company selling computer vision quality inspection to manufacturers",
    "A healthcare SaaS platform for independent medical practices",
    "An e-commerce marketplace for sustainable consumer products",
    "A cybersecurity vendor providing endpoint protection to large enterprises",
    "A logistics company operating last-mile delivery in dense cities",
    "An edtech company running online coding bootcamps",
];

/// What to run for every company in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub kind: AnalysisKind,
    pub model: ModelId,
    /// Pause between consecutive tests, to stay under provider rate limits.
    pub pause: Duration,
}

impl BatchOptions {
    pub fn new(kind: AnalysisKind, model: ModelId) -> Self {
        Self {
            kind,
            model,
            pause: Duration::from_secs(2),
        }
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }
}

/// Results of a batch run with their summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub summary: BatchSummary,
    pub results: Vec<TestResult>,
}

/// Runs one test per company, in order. Blank contexts are skipped.
pub async fn run_batch<S: AsRef<str>>(
    assembler: &ResultAssembler,
    companies: &[S],
    options: BatchOptions,
) -> BatchReport {
    let mut results = Vec::with_capacity(companies.len());

    for (idx, company) in companies.iter().enumerate() {
        let request = match AnalysisRequest::new(company.as_ref(), options.model, options.kind) {
            Ok(request) => request,
            Err(err) => {
                warn!(index = idx, error = %err, "Skipping batch entry");
                continue;
            }
        };

        if !results.is_empty() && !options.pause.is_zero() {
            tokio::time::sleep(options.pause).await;
        }

        info!(
            index = idx + 1,
            total = companies.len(),
            kind = %options.kind,
            model = %options.model,
            "Running batch test"
        );
        results.push(assembler.run(request).await);
    }

    let summary = BatchSummary::from_results(&results);
    info!(
        total = summary.total,
        passing = summary.passing,
        average_quality_score = summary.average_quality_score,
        "Batch completed"
    );
    BatchReport { summary, results }
}
