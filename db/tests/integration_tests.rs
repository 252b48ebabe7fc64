use std::sync::Arc;

use chrono::Utc;
use prompt_harness_core::{
    AnalysisKind, AnalysisRequest, ExtractedMetrics, ModelId, ProviderErrorKind, QualityTier,
    RawResponse, ResultBundle, TestResult, ValidationResult,
};
use prompt_harness_db::{DatabaseError, HarnessConfig, ResultStore};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn result(id: &str, kind: AnalysisKind, response: RawResponse) -> TestResult {
    let failed = response.is_failure();
    TestResult {
        test_id: id.to_string(),
        timestamp: Utc::now(),
        request: AnalysisRequest::new("Cybersecurity endpoint protection", ModelId::Gemini, kind)
            .unwrap(),
        prompt_preview: "You are a senior financial analyst...".to_string(),
        response,
        metrics: ExtractedMetrics::default(),
        validation: ValidationResult {
            quality_score: if failed { 0.0 } else { 0.55 },
            section_coverage: 0.0,
            element_coverage: 0.0,
            response_length: 0,
            missing_requirements: vec!["WACC Calculation".to_string()],
            recommendations: Vec::new(),
            sections_found: Vec::new(),
            element_hits: Vec::new(),
            indicators: Vec::new(),
            quality_tier: if failed {
                QualityTier::Failed
            } else {
                QualityTier::Low
            },
            passed: false,
        },
        response_digest: "cd".repeat(32),
        warnings: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Result log
// ---------------------------------------------------------------------------

#[test]
fn test_reopen_replays_records_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.jsonl");

    {
        let store = ResultStore::open(&path).unwrap();
        store
            .append(result("one", AnalysisKind::Tam, RawResponse::success("text", 10)))
            .unwrap();
        store
            .append(result(
                "two",
                AnalysisKind::Dcf,
                RawResponse::failure(ProviderErrorKind::AuthError, "401", 5),
            ))
            .unwrap();
    }

    let store = ResultStore::open(&path).unwrap();
    let ids: Vec<_> = store.list(None).into_iter().map(|r| r.test_id).collect();
    assert_eq!(ids, vec!["one", "two"]);
    assert_eq!(
        store.get("two").unwrap().provider_error(),
        Some(ProviderErrorKind::AuthError)
    );

    store
        .append(result("three", AnalysisKind::Tam, RawResponse::success("x", 1)))
        .unwrap();
    let err = store
        .append(result("one", AnalysisKind::Tam, RawResponse::success("x", 1)))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::DuplicateId(_)));

    let lines = std::fs::read_to_string(&path).unwrap();
    assert_eq!(lines.lines().count(), 3);
}

#[test]
fn test_concurrent_appends_are_all_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.jsonl");
    let store = Arc::new(ResultStore::open(&path).unwrap());

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let store = Arc::clone(&store);
            scope.spawn(move || {
                for n in 0..25 {
                    let id = format!("w{worker}-{n}");
                    store
                        .append(result(&id, AnalysisKind::Tam, RawResponse::success("ok", 1)))
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(store.len(), 100);
    drop(store);

    let reopened = ResultStore::open(&path).unwrap();
    assert_eq!(reopened.len(), 100);
    assert!(reopened.get("w3-24").is_some());
}

#[test]
fn test_log_records_are_camel_case_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.jsonl");
    let store = ResultStore::open(&path).unwrap();
    store
        .append(result(
            "auth",
            AnalysisKind::Dcf,
            RawResponse::failure(ProviderErrorKind::AuthError, "bad key", 3),
        ))
        .unwrap();

    let line = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(value["testId"], "auth");
    assert_eq!(value["request"]["companyContext"], "Cybersecurity endpoint protection");
    assert_eq!(value["response"]["providerError"], "AuthError");
    assert_eq!(value["validation"]["qualityScore"], 0.0);
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[test]
fn test_export_roundtrips_through_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let store = ResultStore::in_memory();
    store
        .append(result("t", AnalysisKind::Tam, RawResponse::success("a", 1)))
        .unwrap();
    store
        .append(result("d", AnalysisKind::Dcf, RawResponse::success("b", 1)))
        .unwrap();

    let path = dir.path().join("all.json");
    let receipt = store.export_to_file(None, &path).unwrap();
    assert_eq!(receipt.total_tests, 2);

    let bundle: ResultBundle =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(bundle.kind, None);
    assert_eq!(bundle.total_tests, 2);
    assert_eq!(bundle.results, store.list(None));
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn test_config_file_drives_profiles_and_framework() {
    let dir = tempfile::tempdir().unwrap();
    let framework = dir.path().join("dcf_framework.md");
    std::fs::write(&framework, "## Model Construction\nBuild a 10-year model.").unwrap();

    let yaml = format!(
        r#"
profiles:
  dcf:
    framework_path: {}
    merge_strategy: replace
    checklist:
      sections: ["Model Construction", "WACC Calculation"]
"#,
        framework.display()
    );
    let config_path = dir.path().join("harness.yml");
    std::fs::write(&config_path, yaml).unwrap();

    let config = HarnessConfig::load(&config_path).unwrap();
    let profile = config.scoring_profile(AnalysisKind::Dcf).unwrap();
    assert_eq!(
        profile.checklist.sections,
        vec!["Model Construction", "WACC Calculation"]
    );
    assert_eq!(profile.checklist.elements.len(), 18);

    let text = config.framework_text(AnalysisKind::Dcf).unwrap().unwrap();
    assert!(text.starts_with("## Model Construction"));
    assert!(config.framework_text(AnalysisKind::Tam).unwrap().is_none());
}

#[test]
fn test_missing_config_file_is_io_error() {
    let err = HarnessConfig::load("/nonexistent/harness.yml").unwrap_err();
    assert!(matches!(err, DatabaseError::IoError(_)));
}
