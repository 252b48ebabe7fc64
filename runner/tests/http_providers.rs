use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use prompt_harness_core::ProviderErrorKind;
use prompt_harness_db::ProviderConfig;
use prompt_harness_runner::provider::{GeminiProvider, OpenRouterProvider};
use prompt_harness_runner::Provider;
use serde_json::{Value, json};

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

async fn chat_ok(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer test-key");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "bad key"})));
    }
    let title = headers
        .get("x-title")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{"message": {"role": "assistant", "content": format!("{title}|{} chars", prompt.len())}}]
        })),
    )
}

async fn chat_empty() -> Json<Value> {
    Json(json!({"choices": []}))
}

async fn rate_limited() -> impl IntoResponse {
    (StatusCode::TOO_MANY_REQUESTS, "slow down")
}

async fn server_error() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "")
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(json!({"choices": []}))
}

async fn gemini_ok(Json(body): Json<Value>) -> Json<Value> {
    let prompt = body["contents"][0]["parts"][0]["text"]
        .as_str()
        .unwrap_or_default();
    let max_tokens = body["generationConfig"]["maxOutputTokens"].as_u64().unwrap_or(0);
    Json(json!({
        "candidates": [{"content": {"parts": [{"text": format!("{prompt}:{max_tokens}")}]}}]
    }))
}

async fn spawn_stub() -> SocketAddr {
    let app = Router::new()
        .route("/ok/chat/completions", post(chat_ok))
        .route("/empty/chat/completions", post(chat_empty))
        .route("/limited/chat/completions", post(rate_limited))
        .route("/down/chat/completions", post(server_error))
        .route("/slow/chat/completions", post(slow))
        .route("/models/gemini-test:generateContent", post(gemini_ok))
        .route("/models/gemini-denied:generateContent", post(|| async {
            (StatusCode::FORBIDDEN, "API key not valid")
        }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn provider_config(base_url: String, model: &str) -> ProviderConfig {
    ProviderConfig {
        base_url,
        model: model.to_string(),
        api_key_env: "HARNESS_TEST_UNUSED_KEY".to_string(),
        timeout_secs: 1,
        max_tokens: 512,
        temperature: 0.2,
    }
}

fn openrouter(addr: SocketAddr, path: &str, key: Option<&str>) -> OpenRouterProvider {
    let config = provider_config(format!("http://{addr}/{path}"), "qwen-test");
    OpenRouterProvider::with_key(&config, key.map(String::from))
        .unwrap()
        .with_attribution("http://localhost", "Harness Tests")
}

// ---------------------------------------------------------------------------
// OpenRouter
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_openrouter_returns_message_content() {
    let addr = spawn_stub().await;
    let reply = openrouter(addr, "ok", Some("test-key"))
        .complete("hello")
        .await
        .unwrap();
    assert_eq!(reply.text, "Harness Tests|5 chars");
}

#[tokio::test]
async fn test_openrouter_classifies_failures() {
    let addr = spawn_stub().await;

    let cases = [
        ("ok", Some("wrong-key"), ProviderErrorKind::AuthError),
        ("limited", Some("test-key"), ProviderErrorKind::RateLimitError),
        ("down", Some("test-key"), ProviderErrorKind::ProviderServerError),
        ("empty", Some("test-key"), ProviderErrorKind::ProviderServerError),
        ("slow", Some("test-key"), ProviderErrorKind::Timeout),
    ];
    for (path, key, expected) in cases {
        let failure = openrouter(addr, path, key)
            .complete("hello")
            .await
            .unwrap_err();
        assert_eq!(failure.kind, expected, "{path}: {}", failure.detail);
    }
}

#[tokio::test]
async fn test_missing_key_is_auth_error_without_request() {
    let addr = spawn_stub().await;
    let failure = openrouter(addr, "ok", None)
        .complete("hello")
        .await
        .unwrap_err();
    assert_eq!(failure.kind, ProviderErrorKind::AuthError);
    assert!(failure.detail.contains("HARNESS_TEST_UNUSED_KEY"));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let failure = openrouter(addr, "ok", Some("test-key"))
        .complete("hello")
        .await
        .unwrap_err();
    assert_eq!(failure.kind, ProviderErrorKind::NetworkError);
}

// ---------------------------------------------------------------------------
// Gemini
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_gemini_returns_candidate_text() {
    let addr = spawn_stub().await;
    let config = provider_config(format!("http://{addr}"), "gemini-test");
    let provider = GeminiProvider::with_key(&config, Some("test-key".into())).unwrap();

    let reply = provider.complete("value this").await.unwrap();
    assert_eq!(reply.text, "value this:512");
}

#[tokio::test]
async fn test_gemini_forbidden_is_auth_error_without_leaking_key() {
    let addr = spawn_stub().await;
    let config = provider_config(format!("http://{addr}"), "gemini-denied");
    let provider = GeminiProvider::with_key(&config, Some("secret-key".into())).unwrap();

    let failure = provider.complete("value this").await.unwrap_err();
    assert_eq!(failure.kind, ProviderErrorKind::AuthError);
    assert!(failure.detail.contains("API key not valid"));
    assert!(!failure.detail.contains("secret-key"));
}
