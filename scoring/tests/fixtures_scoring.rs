use std::fs;
use std::path::PathBuf;

use prompt_harness_core::{AnalysisKind, QualityTier};
use prompt_harness_scoring::Scorer;

#[test]
fn test_complete_tam_fixture_scores_full_marks() {
    let text = fixture("tam_complete.txt");
    let scorer = Scorer::builtin(AnalysisKind::Tam).expect("builtin profile compiles");

    let card = scorer.score(&text);
    let validation = &card.validation;

    assert_eq!(validation.section_coverage, 1.0);
    assert_eq!(validation.element_coverage, 1.0);
    assert!(validation.response_length >= 1000);
    assert!((validation.quality_score - 1.0).abs() < 1e-12);
    assert_eq!(validation.quality_tier, QualityTier::High);
    assert!(validation.passed);
    assert!(validation.missing_requirements.is_empty());
    assert!(validation.recommendations.is_empty());
    assert!(validation.indicators.iter().all(|indicator| indicator.present));

    let metrics = &card.metrics;
    assert_eq!(metrics.number("tam_low"), Some(1.4e9));
    assert_eq!(metrics.number("tam_high"), Some(1.8e9));
    assert_eq!(metrics.number("tam_central"), Some(1.6e9));
    assert_eq!(metrics.number("confidence_interval"), Some(0.9));
    assert_eq!(metrics.number("cagr"), Some(0.11));
    assert_eq!(metrics.number("market_share"), Some(0.045));
    assert_eq!(metrics.number("penetration_rate"), Some(0.06));
    assert_eq!(metrics.text("geographic_scope"), Some("national"));
}

#[test]
fn test_complete_dcf_fixture_extracts_valuation_inputs() {
    let text = fixture("dcf_complete.txt");
    let scorer = Scorer::builtin(AnalysisKind::Dcf).expect("builtin profile compiles");

    let card = scorer.score(&text);
    assert_eq!(card.validation.section_coverage, 1.0);
    assert_eq!(card.validation.element_coverage, 1.0);
    assert_eq!(card.validation.quality_tier, QualityTier::High);

    let metrics = &card.metrics;
    assert_eq!(metrics.number("wacc"), Some(0.101), "anchored WACC wins");
    assert_eq!(metrics.number("cost_of_equity"), Some(0.112));
    assert_eq!(metrics.number("cost_of_debt"), Some(0.06));
    assert_eq!(metrics.number("terminal_growth"), Some(0.03));
    assert_eq!(metrics.number("scenario_bull_revenue"), Some(3.1e8));
    assert_eq!(metrics.number("scenario_base_revenue"), Some(2.6e8));
    assert_eq!(metrics.number("scenario_bear_revenue"), Some(2.05e8));
    assert_eq!(metrics.number("equity_value"), Some(1.9e9));
    assert_eq!(metrics.number("per_share_value"), Some(38.4));
    assert_eq!(metrics.number("cagr"), Some(0.167));
    assert!(card.warnings().is_empty());
}

#[test]
fn test_partial_tam_fixture_gets_targeted_recommendations() {
    let text = fixture("tam_partial.txt");
    let scorer = Scorer::builtin(AnalysisKind::Tam).expect("builtin profile compiles");

    let validation = scorer.validate(&text);
    assert_eq!(validation.section_coverage, 0.0);
    assert_eq!(validation.element_coverage, 0.2);
    assert_eq!(validation.quality_tier, QualityTier::Low);
    assert!(!validation.passed);
    assert_eq!(validation.missing_requirements[0], "Opening Overview");
    assert_eq!(validation.missing_requirements.len(), 14);

    let recs = &validation.recommendations;
    assert_eq!(recs.len(), scorer.profile().scoring.max_recommendations);
    assert_eq!(
        recs[0],
        "Consider adding more explicit section headers to guide the LLM"
    );
    assert!(recs.iter().any(|rec| rec.starts_with("Response is shorter than")));
}

#[test]
fn test_tam_fixture_scored_as_dcf_scores_lower() {
    let text = fixture("tam_complete.txt");
    let tam = Scorer::builtin(AnalysisKind::Tam).expect("builtin profile compiles");
    let dcf = Scorer::builtin(AnalysisKind::Dcf).expect("builtin profile compiles");

    assert!(dcf.validate(&text).quality_score < tam.validate(&text).quality_score);
}

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(path).expect("fixture file must be readable")
}
