//! Score aggregation and recommendation mapping.

use std::collections::HashSet;

use prompt_harness_core::{AnalysisKind, QualityTier, ScoringConfig, ValidationResult};

use crate::checklist::ChecklistOutcome;

/// Recommendation emitted when the provider returned no text.
pub const EMPTY_RESPONSE_RECOMMENDATION: &str =
    "No response text was received; check the provider error and API key configuration";

/// Length component of the score: 1.0 at or above the minimum, linear below.
pub fn length_adequacy(response_length: usize, min_response_length: usize) -> f64 {
    if min_response_length == 0 {
        return 1.0;
    }
    (response_length as f64 / min_response_length as f64).clamp(0.0, 1.0)
}

/// Weighted, normalized quality score in `[0, 1]`.
pub fn quality_score(
    section_coverage: f64,
    element_coverage: f64,
    response_length: usize,
    scoring: &ScoringConfig,
) -> f64 {
    let weights = scoring.weights;
    let sum = weights.sum();
    if !sum.is_finite() || sum <= 0.0 {
        return 0.0;
    }
    let weighted = weights.section_weight * section_coverage
        + weights.element_weight * element_coverage
        + weights.length_weight * length_adequacy(response_length, scoring.min_response_length);
    (weighted / sum).clamp(0.0, 1.0)
}

/// Assigns the quality tier for a score and its coverages.
pub fn quality_tier(
    score: f64,
    section_coverage: f64,
    element_coverage: f64,
    scoring: &ScoringConfig,
) -> QualityTier {
    if score <= 0.0 {
        QualityTier::Failed
    } else if score >= scoring.min_quality_score
        && section_coverage >= scoring.min_section_coverage
        && element_coverage >= scoring.min_element_coverage
    {
        QualityTier::High
    } else if score >= scoring.min_quality_score {
        QualityTier::Medium
    } else {
        QualityTier::Low
    }
}

/// Combines a checklist outcome and response length into a
/// [`ValidationResult`].
pub fn aggregate(
    kind: AnalysisKind,
    outcome: &ChecklistOutcome,
    response_length: usize,
    scoring: &ScoringConfig,
) -> ValidationResult {
    let section_coverage = outcome.section_coverage();
    let element_coverage = outcome.element_coverage();
    let quality_score = if response_length == 0 {
        0.0
    } else {
        quality_score(section_coverage, element_coverage, response_length, scoring)
    };
    let missing_requirements = outcome.missing_requirements();
    let recommendations = recommendations(
        kind,
        outcome,
        section_coverage,
        element_coverage,
        response_length,
        missing_requirements.len(),
        scoring,
    );

    ValidationResult {
        quality_score,
        section_coverage,
        element_coverage,
        response_length,
        missing_requirements,
        recommendations,
        sections_found: outcome.sections_found.clone(),
        element_hits: outcome.element_hits.clone(),
        indicators: outcome.indicators.clone(),
        quality_tier: quality_tier(quality_score, section_coverage, element_coverage, scoring),
        passed: quality_score >= scoring.min_quality_score,
    }
}

fn recommendations(
    kind: AnalysisKind,
    outcome: &ChecklistOutcome,
    section_coverage: f64,
    element_coverage: f64,
    response_length: usize,
    missing_count: usize,
    scoring: &ScoringConfig,
) -> Vec<String> {
    let mut candidates = Vec::new();

    if response_length == 0 {
        candidates.push(EMPTY_RESPONSE_RECOMMENDATION.to_string());
    }
    if section_coverage < scoring.min_section_coverage {
        candidates.push(match kind {
            AnalysisKind::Tam => {
                "Consider adding more explicit section headers to guide the LLM".to_string()
            }
            AnalysisKind::Dcf => {
                "Consider adding more explicit section headers to guide the AI model".to_string()
            }
        });
    }
    if element_coverage < scoring.min_element_coverage {
        candidates.push(match kind {
            AnalysisKind::Tam => {
                "Add more specific examples of required elements in the prompt".to_string()
            }
            AnalysisKind::Dcf => {
                "Add more specific examples of required DCF elements in the prompt".to_string()
            }
        });
    }
    if response_length > 0 && response_length < scoring.min_response_length {
        candidates.push(format!(
            "Response is shorter than {} characters; ask for a more detailed analysis",
            scoring.min_response_length
        ));
    }
    candidates.extend(outcome.absent_signal_recommendations.iter().cloned());
    if missing_count > scoring.max_missing_requirements {
        candidates.push(match kind {
            AnalysisKind::Tam => {
                "Prompt may be too complex - consider breaking into smaller, focused sections"
                    .to_string()
            }
            AnalysisKind::Dcf => {
                "DCF prompt may be too complex - consider breaking into focused sections"
                    .to_string()
            }
        });
    }
    for section in &outcome.missing_sections {
        candidates.push(format!("Request a \"{section}\" section explicitly"));
    }
    for (name, hint) in &outcome.missing_elements {
        candidates.push(format!(
            "Ask explicitly for {}",
            hint.as_deref().unwrap_or(name)
        ));
    }

    dedup_capped(candidates, scoring.max_recommendations)
}

/// Drops repeats (first occurrence wins) and keeps at most `cap` entries.
pub fn dedup_capped(candidates: Vec<String>, cap: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|rec| seen.insert(rec.clone()))
        .take(cap)
        .collect()
}
