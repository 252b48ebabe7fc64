use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use prompt_harness_db::{HarnessConfig, ResultStore};
use prompt_harness_runner::{
    ProviderFailure, ProviderReply, ProviderSet, ResultAssembler, ScriptedProvider,
};
use prompt_harness_server::{AppState, router};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

const TAM_REPLY: &str = "## Opening Overview\nMarket Size: $10 billion to $20 billion, \
                         central estimate $15 billion (95% confidence interval)";

fn state_with(provider: ScriptedProvider, export_dir: &std::path::Path) -> AppState {
    state_sharing(Arc::new(provider), export_dir)
}

fn state_sharing(provider: Arc<ScriptedProvider>, export_dir: &std::path::Path) -> AppState {
    let mut config = HarnessConfig::default();
    config.results.export_dir = export_dir.to_path_buf();
    config.results.log_path = None;
    let assembler = ResultAssembler::new(
        ProviderSet::uniform(provider),
        Arc::new(ResultStore::in_memory()),
    )
    .unwrap();
    AppState::new(assembler, config)
}

fn form_post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_single_runs_tam_test_and_stores_it() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(
        ScriptedProvider::always(Ok(ProviderReply::new(TAM_REPLY))),
        dir.path(),
    );

    let (status, body) = send(
        &state,
        form_post("/test-single", "company_context=A+fintech+startup&model_choice=gemini"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["request"]["modelId"], "gemini");
    assert_eq!(body["result"]["request"]["kind"], "tam");
    assert_eq!(body["result"]["metrics"]["tam_high"], 2e10);

    let test_id = body["result"]["testId"].as_str().unwrap().to_string();
    let (status, fetched) = send(&state, get(&format!("/results/{test_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["result"]["testId"], test_id.as_str());
}

#[tokio::test]
async fn test_model_choice_defaults_to_qwen() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(
        ScriptedProvider::always(Ok(ProviderReply::new("ok"))),
        dir.path(),
    );
    let (status, body) = send(&state, form_post("/test-dcf", "company_context=Logistics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["request"]["modelId"], "qwen");
    assert_eq!(body["result"]["request"]["kind"], "dcf");
}

#[tokio::test]
async fn test_invalid_requests_are_rejected_before_provider_call() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(ScriptedProvider::always(Ok(ProviderReply::new("ok"))));
    let state = state_sharing(provider.clone(), dir.path());

    for body in [
        "model_choice=qwen",
        "company_context=++&model_choice=qwen",
        "company_context=SaaS&model_choice=gpt",
    ] {
        let (status, json) = send(&state, form_post("/test-single", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }
    assert_eq!(provider.calls(), 0);
    assert!(state.assembler.store().is_empty());
}

#[tokio::test]
async fn test_provider_failure_still_returns_result() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(
        ScriptedProvider::always(Err(ProviderFailure::auth("HTTP 401 Unauthorized"))),
        dir.path(),
    );

    let (status, body) = send(&state, form_post("/test-single", "company_context=Edtech")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["response"]["providerError"], "AuthError");
    assert_eq!(body["result"]["validation"]["qualityScore"], 0.0);
}

#[tokio::test]
async fn test_unknown_result_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(ScriptedProvider::always(Ok(ProviderReply::new("ok"))), dir.path());
    let (status, body) = send(&state, get("/results/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_export_endpoints_filter_by_kind() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(
        ScriptedProvider::always(Ok(ProviderReply::new(TAM_REPLY))),
        dir.path(),
    );
    send(&state, form_post("/test-single", "company_context=A")).await;
    send(&state, form_post("/test-single", "company_context=B")).await;
    send(&state, form_post("/test-dcf", "company_context=C")).await;

    let (status, tam) = send(&state, get("/export-results")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tam["success"], true);
    assert_eq!(tam["kind"], "tam");
    assert_eq!(tam["totalTests"], 2);
    assert!(tam["exportTimestamp"].is_string());

    let (_, dcf) = send(&state, get("/export-dcf-results")).await;
    assert_eq!(dcf["totalTests"], 1);
    assert_eq!(dcf["results"][0]["request"]["companyContext"], "C");
}

#[tokio::test]
async fn test_export_writes_into_export_dir() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(
        ScriptedProvider::always(Ok(ProviderReply::new(TAM_REPLY))),
        dir.path(),
    );
    send(&state, form_post("/test-dcf", "company_context=C")).await;

    let (status, body) = send(&state, form_post("/export", "kind=dcf")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalTests"], 1);
    let written = dir.path().join("dcf_test_results.json");
    assert!(written.exists());
    assert_eq!(body["path"], written.display().to_string());

    let (status, _) = send(&state, form_post("/export", "path=..%2Fescape.json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&state, form_post("/export", "kind=npv")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_lists_models() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(ScriptedProvider::always(Ok(ProviderReply::new("ok"))), dir.path());
    let (status, body) = send(&state, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["models"]["gemini"], "gemini-1.5-pro");
    assert!(body["timestamp"].is_string());
}
