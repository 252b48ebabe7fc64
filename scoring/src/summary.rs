//! Aggregate statistics over a set of test results.

use std::collections::BTreeMap;

use prompt_harness_core::{QualityTier, TestResult};
use serde::{Deserialize, Serialize};

/// Quality score at or above which a result counts as high quality in
/// reports.
pub const HIGH_QUALITY_SCORE: f64 = 0.8;

/// Summary of a batch of test results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub average_quality_score: f64,
    pub passing: usize,
    pub high_quality: usize,
    /// Count per quality tier, keyed by tier name.
    pub tiers: BTreeMap<String, usize>,
    /// Provider failures keyed by error kind.
    pub provider_failures: BTreeMap<String, usize>,
}

impl BatchSummary {
    /// Summarizes `results`. An empty slice yields an all-zero summary.
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_harness_scoring::BatchSummary;
    ///
    /// let summary = BatchSummary::from_results(&[]);
    /// assert_eq!(summary.total, 0);
    /// assert_eq!(summary.average_quality_score, 0.0);
    /// ```
    pub fn from_results(results: &[TestResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };
        if results.is_empty() {
            return summary;
        }

        let mut score_sum = 0.0;
        for result in results {
            let validation = &result.validation;
            score_sum += validation.quality_score;
            if validation.passed {
                summary.passing += 1;
            }
            if validation.quality_score >= HIGH_QUALITY_SCORE {
                summary.high_quality += 1;
            }
            *summary
                .tiers
                .entry(validation.quality_tier.to_string())
                .or_default() += 1;
            if let Some(kind) = result.provider_error() {
                *summary
                    .provider_failures
                    .entry(kind.to_string())
                    .or_default() += 1;
            }
        }
        summary.average_quality_score = score_sum / results.len() as f64;
        summary
    }

    pub fn failed(&self) -> usize {
        self.tiers
            .get(&QualityTier::Failed.to_string())
            .copied()
            .unwrap_or(0)
    }
}
