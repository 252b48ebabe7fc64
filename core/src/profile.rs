//! Scoring profiles: checklists, signal rules, weights and thresholds.
//!
//! A [`ScoringProfile`] is the immutable configuration a scorer is built
//! from. The built-in TAM and DCF profiles mirror the report frameworks the
//! harness was written for; YAML configuration can overlay them (see
//! [`merge_checklists`](crate::merge_checklists)).

use serde::{Deserialize, Serialize};

use crate::AnalysisKind;

/// Default minimum quality score for a response to pass.
pub const DEFAULT_MIN_QUALITY_SCORE: f64 = 0.7;

/// Default section coverage below which a recommendation is emitted.
pub const DEFAULT_MIN_SECTION_COVERAGE: f64 = 0.8;

/// Default element coverage below which a recommendation is emitted.
pub const DEFAULT_MIN_ELEMENT_COVERAGE: f64 = 0.7;

/// Default response length (characters) considered adequate.
pub const DEFAULT_MIN_RESPONSE_LENGTH: usize = 1000;

/// Default number of missing requirements tolerated before the prompt is
/// flagged as too complex.
pub const DEFAULT_MAX_MISSING_REQUIREMENTS: usize = 3;

/// Default cap on the recommendation list.
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 6;

/// A required content element, matched case-insensitively as a regex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRequirement {
    pub name: String,
    pub pattern: String,
    /// Human-readable description used in recommendations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ElementRequirement {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// An informational signal: reported as an indicator and, when absent,
/// turned into its recommendation. Signals never change the quality score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRule {
    pub name: String,
    pub pattern: String,
    pub recommendation: String,
}

impl SignalRule {
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            recommendation: recommendation.into(),
        }
    }
}

/// Required sections, elements and signals for one analysis kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistConfig {
    /// Section headings, matched as case-insensitive substrings.
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub elements: Vec<ElementRequirement>,
    #[serde(default)]
    pub signals: Vec<SignalRule>,
}

/// Relative weights of the three score components.
///
/// Weights are normalized by their sum, so `{2, 2, 1}` behaves like
/// `{0.4, 0.4, 0.2}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub section_weight: f64,
    pub element_weight: f64,
    pub length_weight: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            section_weight: 0.4,
            element_weight: 0.4,
            length_weight: 0.2,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.section_weight + self.element_weight + self.length_weight
    }
}

/// Thresholds and caps used by the score aggregator.
///
/// # Examples
///
/// ```
/// use prompt_harness_core::ScoringConfig;
///
/// let scoring = ScoringConfig::default();
/// assert_eq!(scoring.min_quality_score, 0.7);
/// assert_eq!(scoring.min_section_coverage, 0.8);
/// assert_eq!(scoring.min_element_coverage, 0.7);
/// assert_eq!(scoring.min_response_length, 1000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub min_response_length: usize,
    pub min_quality_score: f64,
    pub min_section_coverage: f64,
    pub min_element_coverage: f64,
    pub max_missing_requirements: usize,
    pub max_recommendations: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            min_response_length: DEFAULT_MIN_RESPONSE_LENGTH,
            min_quality_score: DEFAULT_MIN_QUALITY_SCORE,
            min_section_coverage: DEFAULT_MIN_SECTION_COVERAGE,
            min_element_coverage: DEFAULT_MIN_ELEMENT_COVERAGE,
            max_missing_requirements: DEFAULT_MAX_MISSING_REQUIREMENTS,
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
        }
    }
}

/// Complete scoring configuration for one analysis kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub kind: AnalysisKind,
    pub checklist: ChecklistConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl ScoringProfile {
    /// Returns the built-in profile for `kind`.
    pub fn builtin(kind: AnalysisKind) -> Self {
        match kind {
            AnalysisKind::Tam => Self::tam(),
            AnalysisKind::Dcf => Self::dcf(),
        }
    }

    /// Built-in Total Addressable Market profile.
    ///
    /// # Examples
    ///
    /// ```
    /// use prompt_harness_core::{ScoringProfile, validate_profile};
    ///
    /// let profile = ScoringProfile::tam();
    /// assert_eq!(profile.checklist.sections.len(), 6);
    /// assert_eq!(profile.checklist.elements.len(), 10);
    /// assert!(validate_profile(&profile).is_empty());
    /// ```
    pub fn tam() -> Self {
        let sections = [
            "Opening Overview",
            "Bottom-Up Analysis",
            "Top-Down Analysis",
            "Hybrid Analysis",
            "Market Capture Analysis",
            "Final Deliverables",
        ];
        let elements = vec![
            ElementRequirement::new("market_size", r"\$[\d,]+(?:\.\d+)?[BMK]?")
                .with_hint("dollar-denominated market size figures"),
            ElementRequirement::new("confidence_intervals", r"confidence|interval|range")
                .with_hint("confidence intervals around the estimate"),
            ElementRequirement::new("methodology", r"method|approach|analysis")
                .with_hint("a stated estimation methodology"),
            ElementRequirement::new(
                "customer_segments",
                r"segment|customer|enterprise|SMB|consumer",
            )
            .with_hint("customer segmentation"),
            ElementRequirement::new(
                "acv_ltv",
                r"ACV|LTV|average customer value|lifetime value",
            )
            .with_hint("ACV and LTV assumptions"),
            ElementRequirement::new("penetration_rate", r"penetration|market share|capture")
                .with_hint("penetration or market share assumptions"),
            ElementRequirement::new("sources", r"source|reference|Gartner|IDC|McKinsey")
                .with_hint("cited data sources"),
            ElementRequirement::new("sensitivity", r"sensitivity|±\d+%|scenario")
                .with_hint("sensitivity ranges"),
            ElementRequirement::new("revenue_projection", r"revenue|projection|3-year|5-year")
                .with_hint("multi-year revenue projections"),
            ElementRequirement::new(
                "constraints_enablers",
                r"constraint|enabler|barrier|moat",
            )
            .with_hint("market constraints and enablers"),
        ];
        let signals = vec![
            SignalRule::new(
                "has_calculations",
                r"\d+\s*[+\-*/×]\s*\d+|\$[\d,]+",
                "Prompt should explicitly request numerical calculations and formulas",
            ),
            SignalRule::new(
                "has_tables",
                r"table|worksheet|excel|\|\s*-{3,}",
                "Consider requesting structured table outputs for better organization",
            ),
        ];

        Self {
            kind: AnalysisKind::Tam,
            checklist: ChecklistConfig {
                sections: sections.iter().map(|s| s.to_string()).collect(),
                elements,
                signals,
            },
            scoring: ScoringConfig::default(),
        }
    }

    /// Built-in Discounted Cash Flow profile.
    ///
    /// Uses a five-recommendation tolerance for missing requirements since
    /// the DCF checklist is twice as long as the TAM one.
    pub fn dcf() -> Self {
        let sections = [
            "Model Construction",
            "DCF Summary Table",
            "WACC Calculation",
            "Three-Statement Model",
            "Scenario Analysis",
            "Sensitivity Analysis",
            "Historical Benchmarking",
            "Key Value Drivers",
            "Final Deliverables",
        ];
        let element = ElementRequirement::new;
        let elements = vec![
            element("revenue_projection", r"revenue|sales|top line"),
            element("free_cash_flow", r"free cash flow|FCF"),
            element("discounted_cash_flow", r"discounted|DCF|present value"),
            element("terminal_value", r"terminal value|perpetuity"),
            element("wacc_calculation", r"WACC|weighted average cost of capital"),
            element("cost_of_equity", r"cost of equity|CAPM|beta"),
            element("cost_of_debt", r"cost of debt|interest rate"),
            element("growth_rates", r"growth rate|CAGR|compound annual"),
            element("margin_evolution", r"margin|profitability|operating leverage"),
            element("working_capital", r"working capital|\bAR\b|\bAP\b|inventory"),
            element("capex", r"CapEx|capital expenditure|PP&E"),
            element("depreciation", r"depreciation|amortization"),
            element("tax_rate", r"tax rate|tax expense"),
            element("scenario_analysis", r"bull case|base case|bear case|scenario"),
            element("sensitivity_analysis", r"sensitivity|±\d+%|variation"),
            element("historical_benchmarking", r"historical|benchmark|precedent"),
            element("value_drivers", r"value driver|key driver|valuation swing"),
            element("excel_requirement", r"excel|worksheet|formula|linked"),
        ];
        let signals = vec![
            SignalRule::new(
                "has_financial_calculations",
                r"\d+\s*[+\-*/×]\s*\d+|\$[\d,]+",
                "Prompt should explicitly request numerical DCF calculations and formulas",
            ),
            SignalRule::new(
                "has_tables",
                r"table|worksheet|excel|\|\s*-{3,}",
                "Consider requesting structured DCF tables and Excel-like outputs",
            ),
            SignalRule::new(
                "has_scenarios",
                r"\bbull\b|\bbase case\b|\bbear\b|scenario",
                "Add explicit requirements for bull/base/bear scenario analysis",
            ),
            SignalRule::new(
                "has_sensitivity",
                r"sensitivity|±\d+%",
                "Request sensitivity analysis with specific percentage variations",
            ),
        ];

        Self {
            kind: AnalysisKind::Dcf,
            checklist: ChecklistConfig {
                sections: sections.iter().map(|s| s.to_string()).collect(),
                elements,
                signals,
            },
            scoring: ScoringConfig {
                max_missing_requirements: 5,
                ..ScoringConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate_profile;

    #[test]
    fn test_builtin_profiles_are_valid() {
        for kind in AnalysisKind::ALL {
            let profile = ScoringProfile::builtin(kind);
            assert_eq!(profile.kind, kind);
            assert!(validate_profile(&profile).is_empty(), "{kind} profile invalid");
        }
    }

    #[test]
    fn test_dcf_profile_counts() {
        let profile = ScoringProfile::dcf();
        assert_eq!(profile.checklist.sections.len(), 9);
        assert_eq!(profile.checklist.elements.len(), 18);
        assert_eq!(profile.checklist.signals.len(), 4);
        assert_eq!(profile.scoring.max_missing_requirements, 5);
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let weights = ScoreWeights::default();
        assert!((weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_scoring_config_yaml_defaults_missing_fields() {
        let scoring: ScoringConfig = serde_json::from_str(r#"{"min_response_length": 500}"#).unwrap();
        assert_eq!(scoring.min_response_length, 500);
        assert_eq!(scoring.min_quality_score, DEFAULT_MIN_QUALITY_SCORE);
        assert_eq!(scoring.weights, ScoreWeights::default());
    }
}
