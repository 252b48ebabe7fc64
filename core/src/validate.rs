//! Scoring profile validation.
//!
//! Validates structural invariants of a [`ScoringProfile`] before a scorer is
//! built from it: non-empty checklists, unique names, compilable patterns,
//! usable weights and in-range thresholds. A broken profile is a deployment
//! problem, so callers surface these errors at configuration load time.
//!
//! # Examples
//!
//! ```
//! use prompt_harness_core::*;
//!
//! assert!(validate_profile(&ScoringProfile::tam()).is_empty());
//!
//! let mut broken = ScoringProfile::tam();
//! broken.checklist.sections.clear();
//! assert_eq!(validate_profile(&broken), vec![ConfigError::EmptySections]);
//! ```

use std::collections::HashSet;

use regex::RegexBuilder;
use thiserror::Error;

use crate::{ChecklistConfig, ScoringConfig, ScoringProfile};

/// Profile configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The checklist defines no required sections.
    #[error("required sections list cannot be empty")]
    EmptySections,
    /// The checklist defines no required elements.
    #[error("required elements list cannot be empty")]
    EmptyElements,
    /// A section heading is empty or whitespace-only.
    #[error("section heading cannot be empty")]
    EmptySectionName,
    /// Two sections share a heading (compared case-insensitively).
    #[error("duplicate section: {0}")]
    DuplicateSection(String),
    /// An element or signal name is empty.
    #[error("element or signal name cannot be empty")]
    EmptyName,
    /// Two elements or two signals share a name.
    #[error("duplicate requirement name: {0}")]
    DuplicateName(String),
    /// A pattern does not compile as a regular expression.
    #[error("invalid pattern for {name}: {reason}")]
    InvalidPattern { name: String, reason: String },
    /// A score weight is negative or not finite.
    #[error("invalid weight {name}: {value}")]
    InvalidWeight { name: &'static str, value: f64 },
    /// Score weights do not add up to a positive value.
    #[error("score weights must sum to a positive value, got {0}")]
    NonPositiveWeightSum(f64),
    /// A ratio threshold falls outside `[0.0, 1.0]`.
    #[error("threshold {name} must be between 0.0 and 1.0, got {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },
}

/// Validates a complete scoring profile.
///
/// All problems are reported, checklist errors before scoring errors.
pub fn validate_profile(profile: &ScoringProfile) -> Vec<ConfigError> {
    let mut errors = validate_checklist(&profile.checklist);
    errors.extend(validate_scoring(&profile.scoring));
    errors
}

/// Validates a checklist: non-empty lists, unique names, valid patterns.
///
/// # Examples
///
/// ```
/// use prompt_harness_core::*;
///
/// let checklist = ChecklistConfig {
///     sections: vec!["Overview".into()],
///     elements: vec![ElementRequirement::new("wacc", "WACC(")],
///     signals: Vec::new(),
/// };
/// let errors = validate_checklist(&checklist);
/// assert!(matches!(errors[0], ConfigError::InvalidPattern { .. }));
/// ```
pub fn validate_checklist(checklist: &ChecklistConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if checklist.sections.is_empty() {
        errors.push(ConfigError::EmptySections);
    }
    if checklist.elements.is_empty() {
        errors.push(ConfigError::EmptyElements);
    }

    let mut seen_sections = HashSet::new();
    for section in &checklist.sections {
        let trimmed = section.trim();
        if trimmed.is_empty() {
            errors.push(ConfigError::EmptySectionName);
            continue;
        }
        if !seen_sections.insert(trimmed.to_lowercase()) {
            errors.push(ConfigError::DuplicateSection(trimmed.to_string()));
        }
    }

    let mut seen_elements = HashSet::new();
    for element in &checklist.elements {
        check_named_pattern(
            &element.name,
            &element.pattern,
            &mut seen_elements,
            &mut errors,
        );
    }

    let mut seen_signals = HashSet::new();
    for signal in &checklist.signals {
        check_named_pattern(&signal.name, &signal.pattern, &mut seen_signals, &mut errors);
    }

    errors
}

/// Validates weights and thresholds.
pub fn validate_scoring(scoring: &ScoringConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    let weights = [
        ("section_weight", scoring.weights.section_weight),
        ("element_weight", scoring.weights.element_weight),
        ("length_weight", scoring.weights.length_weight),
    ];
    let mut weights_ok = true;
    for (name, value) in weights {
        if !value.is_finite() || value < 0.0 {
            errors.push(ConfigError::InvalidWeight { name, value });
            weights_ok = false;
        }
    }
    let sum = scoring.weights.sum();
    if weights_ok && sum <= 0.0 {
        errors.push(ConfigError::NonPositiveWeightSum(sum));
    }

    let thresholds = [
        ("min_quality_score", scoring.min_quality_score),
        ("min_section_coverage", scoring.min_section_coverage),
        ("min_element_coverage", scoring.min_element_coverage),
    ];
    for (name, value) in thresholds {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ConfigError::ThresholdOutOfRange { name, value });
        }
    }

    errors
}

fn check_named_pattern(
    name: &str,
    pattern: &str,
    seen: &mut HashSet<String>,
    errors: &mut Vec<ConfigError>,
) {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.push(ConfigError::EmptyName);
        return;
    }
    if !seen.insert(trimmed.to_string()) {
        errors.push(ConfigError::DuplicateName(trimmed.to_string()));
    }
    if let Err(err) = RegexBuilder::new(pattern).case_insensitive(true).build() {
        errors.push(ConfigError::InvalidPattern {
            name: trimmed.to_string(),
            reason: err.to_string(),
        });
    }
}
