//! Rule-based scoring of LLM financial-analysis responses.
//!
//! A [`Scorer`] is compiled once from an immutable
//! [`ScoringProfile`](prompt_harness_core::ScoringProfile) and then scores
//! any number of responses. Scoring is a deterministic single pass:
//!
//! 1. [`metrics::MetricExtractor`] pulls market-size bounds, rates and
//!    scenario values out of the text.
//! 2. [`checklist::CompiledChecklist`] checks required sections, required
//!    elements and informational signals.
//! 3. [`aggregate`] turns coverage and length into a quality score, a tier
//!    and a capped recommendation list.
//!
//! An empty response short-circuits steps 1 and 2 and scores zero with every
//! requirement reported missing.
//!
//! # Example
//!
//! ```
//! use prompt_harness_core::{AnalysisKind, QualityTier};
//! use prompt_harness_scoring::Scorer;
//!
//! let scorer = Scorer::builtin(AnalysisKind::Tam).unwrap();
//!
//! let card = scorer.score("");
//! assert_eq!(card.validation.quality_score, 0.0);
//! assert_eq!(card.validation.quality_tier, QualityTier::Failed);
//! assert_eq!(card.validation.missing_requirements.len(), 16);
//!
//! let card = scorer.score("Market Size: $10 billion to $20 billion");
//! assert_eq!(card.metrics.number("tam_high"), Some(2e10));
//! ```

pub mod aggregate;
pub mod checklist;
pub mod metrics;
pub mod output;
pub mod summary;

use prompt_harness_core::{
    AnalysisKind, ConfigError, ExtractedMetrics, ScoringProfile, ValidationResult,
    validate_profile,
};
use serde::Serialize;
use tracing::debug;

use checklist::CompiledChecklist;
use metrics::{ExtractionDiagnostics, MetricExtractor};

pub use summary::BatchSummary;

/// Everything computed from one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub metrics: ExtractedMetrics,
    pub validation: ValidationResult,
    pub diagnostics: ExtractionDiagnostics,
}

impl Scorecard {
    /// Non-fatal warnings worth attaching to a stored result.
    pub fn warnings(&self) -> Vec<String> {
        self.diagnostics.warnings()
    }
}

/// A compiled, immutable scorer for one analysis kind.
///
/// Cheap to share behind an `Arc`; scoring takes `&self` and touches no
/// shared mutable state.
#[derive(Debug, Clone)]
pub struct Scorer {
    profile: ScoringProfile,
    checklist: CompiledChecklist,
    extractor: MetricExtractor,
}

impl Scorer {
    /// Validates and compiles `profile`, reporting every configuration
    /// error found.
    pub fn new(profile: ScoringProfile) -> Result<Self, Vec<ConfigError>> {
        let errors = validate_profile(&profile);
        if !errors.is_empty() {
            return Err(errors);
        }
        let checklist = CompiledChecklist::compile(&profile.checklist)?;
        let extractor = MetricExtractor::new(profile.kind);
        Ok(Self {
            profile,
            checklist,
            extractor,
        })
    }

    /// Compiles the built-in profile for `kind`.
    pub fn builtin(kind: AnalysisKind) -> Result<Self, Vec<ConfigError>> {
        Self::new(ScoringProfile::builtin(kind))
    }

    pub fn kind(&self) -> AnalysisKind {
        self.profile.kind
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    /// Scores one response text.
    pub fn score(&self, text: &str) -> Scorecard {
        let response_length = text.chars().count();

        if response_length == 0 {
            debug!(kind = %self.kind(), "Scoring empty response");
            return Scorecard {
                metrics: ExtractedMetrics::default(),
                validation: aggregate::aggregate(
                    self.kind(),
                    &self.checklist.empty_outcome(),
                    0,
                    &self.profile.scoring,
                ),
                diagnostics: ExtractionDiagnostics::default(),
            };
        }

        let extraction = self.extractor.extract(text);
        let outcome = self.checklist.evaluate(text);
        let validation =
            aggregate::aggregate(self.kind(), &outcome, response_length, &self.profile.scoring);

        debug!(
            kind = %self.kind(),
            response_length,
            quality_score = validation.quality_score,
            metrics = extraction.metrics.len(),
            malformed = extraction.diagnostics.malformed.len(),
            "Scored response"
        );

        Scorecard {
            metrics: extraction.metrics,
            validation,
            diagnostics: extraction.diagnostics,
        }
    }

    /// Scores `text` and returns only the validation outcome.
    pub fn validate(&self, text: &str) -> ValidationResult {
        self.score(text).validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompt_harness_core::{ChecklistConfig, ElementRequirement, QualityTier};

    #[test]
    fn test_new_reports_checklist_and_scoring_errors() {
        let mut profile = ScoringProfile::tam();
        profile.checklist.sections.clear();
        profile.scoring.min_quality_score = 2.0;
        let errors = Scorer::new(profile).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], ConfigError::EmptySections);
        assert!(matches!(errors[1], ConfigError::ThresholdOutOfRange { .. }));
    }

    #[test]
    fn test_score_is_deterministic() {
        let scorer = Scorer::builtin(AnalysisKind::Dcf).unwrap();
        let text = "## WACC Calculation\nWACC of 9.5%, terminal growth 2.5%.";
        assert_eq!(scorer.score(text), scorer.score(text));
    }

    #[test]
    fn test_headings_only_profile_gives_full_section_no_element_coverage() {
        let profile = ScoringProfile {
            kind: AnalysisKind::Tam,
            checklist: ChecklistConfig {
                sections: vec!["Opening Overview".into(), "Final Deliverables".into()],
                elements: vec![ElementRequirement::new("wacc", r"\bWACC\b")],
                signals: Vec::new(),
            },
            scoring: Default::default(),
        };
        let scorer = Scorer::new(profile).unwrap();
        let validation = scorer.validate("Opening Overview\nFinal Deliverables\n");
        assert_eq!(validation.section_coverage, 1.0);
        assert_eq!(validation.element_coverage, 0.0);
        assert_eq!(validation.missing_requirements, vec!["wacc".to_string()]);
    }

    #[test]
    fn test_whitespace_response_is_not_empty() {
        let scorer = Scorer::builtin(AnalysisKind::Tam).unwrap();
        let validation = scorer.validate("   ");
        assert_eq!(validation.response_length, 3);
        assert!(validation.quality_score > 0.0);
        assert_eq!(validation.quality_tier, QualityTier::Low);
    }
}
