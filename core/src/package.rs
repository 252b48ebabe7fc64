use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnalysisKind, TestResult};

/// Serializable bundle of test results used for export.
///
/// A bundle groups [`TestResult`] records with export metadata, making it
/// suitable for writing to a single JSON file or returning from an HTTP
/// export endpoint.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use prompt_harness_core::*;
///
/// let bundle = ResultBundle::new(Some(AnalysisKind::Dcf), Utc::now(), Vec::new());
/// assert_eq!(bundle.total_tests, 0);
/// assert_eq!(bundle.schema_version.as_deref(), Some(RESULT_CONTRACT_VERSION));
/// assert_eq!(bundle.average_quality_score(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBundle {
    /// Result contract version (populated from
    /// [`RESULT_CONTRACT_VERSION`](crate::RESULT_CONTRACT_VERSION)).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
    pub export_timestamp: DateTime<Utc>,
    /// Analysis kind the results were filtered by, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<AnalysisKind>,
    pub total_tests: usize,
    pub results: Vec<TestResult>,
}

impl ResultBundle {
    /// Creates a bundle; `total_tests` is derived from `results`.
    pub fn new(
        kind: Option<AnalysisKind>,
        export_timestamp: DateTime<Utc>,
        results: Vec<TestResult>,
    ) -> Self {
        Self {
            schema_version: Some(crate::RESULT_CONTRACT_VERSION.to_string()),
            export_timestamp,
            kind,
            total_tests: results.len(),
            results,
        }
    }

    /// Mean quality score across the bundle, `None` when empty.
    pub fn average_quality_score(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        let total: f64 = self.results.iter().map(TestResult::quality_score).sum();
        Some(total / self.results.len() as f64)
    }
}
