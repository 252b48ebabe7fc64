//! Required-section, required-element and signal matching.

use prompt_harness_core::{
    ChecklistConfig, ConfigError, ElementHit, SignalIndicator, validate_checklist,
};
use regex::{Regex, RegexBuilder};

#[derive(Debug, Clone)]
struct CompiledElement {
    name: String,
    hint: Option<String>,
    pattern: Regex,
}

#[derive(Debug, Clone)]
struct CompiledSignal {
    name: String,
    recommendation: String,
    pattern: Regex,
}

/// A checklist with its patterns compiled once, ready to evaluate text.
#[derive(Debug, Clone)]
pub struct CompiledChecklist {
    sections: Vec<String>,
    elements: Vec<CompiledElement>,
    signals: Vec<CompiledSignal>,
}

/// Per-response checklist outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecklistOutcome {
    pub sections_total: usize,
    pub sections_found: Vec<String>,
    pub missing_sections: Vec<String>,
    pub elements_total: usize,
    pub element_hits: Vec<ElementHit>,
    /// Missing element names paired with their hints.
    pub missing_elements: Vec<(String, Option<String>)>,
    pub indicators: Vec<SignalIndicator>,
    /// Recommendations of signals that were not present.
    pub absent_signal_recommendations: Vec<String>,
}

impl ChecklistOutcome {
    pub fn section_coverage(&self) -> f64 {
        ratio(self.sections_found.len(), self.sections_total)
    }

    pub fn element_coverage(&self) -> f64 {
        let found = self.element_hits.iter().filter(|hit| hit.matches > 0).count();
        ratio(found, self.elements_total)
    }

    /// Missing section headings followed by missing element names.
    pub fn missing_requirements(&self) -> Vec<String> {
        self.missing_sections
            .iter()
            .cloned()
            .chain(self.missing_elements.iter().map(|(name, _)| name.clone()))
            .collect()
    }
}

fn ratio(found: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        found as f64 / total as f64
    }
}

impl CompiledChecklist {
    /// Validates and compiles a checklist.
    pub fn compile(config: &ChecklistConfig) -> Result<Self, Vec<ConfigError>> {
        let errors = validate_checklist(config);
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut errors = Vec::new();
        let mut elements = Vec::with_capacity(config.elements.len());
        for element in &config.elements {
            match compile_pattern(&element.name, &element.pattern) {
                Ok(pattern) => elements.push(CompiledElement {
                    name: element.name.trim().to_string(),
                    hint: element.hint.clone(),
                    pattern,
                }),
                Err(err) => errors.push(err),
            }
        }

        let mut signals = Vec::with_capacity(config.signals.len());
        for signal in &config.signals {
            match compile_pattern(&signal.name, &signal.pattern) {
                Ok(pattern) => signals.push(CompiledSignal {
                    name: signal.name.trim().to_string(),
                    recommendation: signal.recommendation.clone(),
                    pattern,
                }),
                Err(err) => errors.push(err),
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Self {
            sections: config.sections.iter().map(|s| s.trim().to_string()).collect(),
            elements,
            signals,
        })
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    pub fn element_names(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|e| e.name.as_str())
    }

    /// Matches sections (case-insensitive substring), elements and signals
    /// (case-insensitive regex) anywhere in `text`.
    pub fn evaluate(&self, text: &str) -> ChecklistOutcome {
        let lowered = text.to_lowercase();
        let mut outcome = ChecklistOutcome {
            sections_total: self.sections.len(),
            elements_total: self.elements.len(),
            ..ChecklistOutcome::default()
        };

        for section in &self.sections {
            if lowered.contains(&section.to_lowercase()) {
                outcome.sections_found.push(section.clone());
            } else {
                outcome.missing_sections.push(section.clone());
            }
        }

        for element in &self.elements {
            let matches = element.pattern.find_iter(text).count();
            if matches == 0 {
                outcome
                    .missing_elements
                    .push((element.name.clone(), element.hint.clone()));
            }
            outcome.element_hits.push(ElementHit {
                name: element.name.clone(),
                matches,
            });
        }

        for signal in &self.signals {
            let present = signal.pattern.is_match(text);
            if !present {
                outcome
                    .absent_signal_recommendations
                    .push(signal.recommendation.clone());
            }
            outcome.indicators.push(SignalIndicator {
                name: signal.name.clone(),
                present,
            });
        }

        outcome
    }

    /// Outcome for an empty response: nothing found, everything missing.
    pub fn empty_outcome(&self) -> ChecklistOutcome {
        ChecklistOutcome {
            sections_total: self.sections.len(),
            sections_found: Vec::new(),
            missing_sections: self.sections.clone(),
            elements_total: self.elements.len(),
            element_hits: self
                .elements
                .iter()
                .map(|e| ElementHit {
                    name: e.name.clone(),
                    matches: 0,
                })
                .collect(),
            missing_elements: self
                .elements
                .iter()
                .map(|e| (e.name.clone(), e.hint.clone()))
                .collect(),
            indicators: self
                .signals
                .iter()
                .map(|s| SignalIndicator {
                    name: s.name.clone(),
                    present: false,
                })
                .collect(),
            absent_signal_recommendations: Vec::new(),
        }
    }
}

fn compile_pattern(name: &str, pattern: &str) -> Result<Regex, ConfigError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| ConfigError::InvalidPattern {
            name: name.trim().to_string(),
            reason: err.to_string(),
        })
}
