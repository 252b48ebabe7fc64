//! HTTP interface for the prompt test harness.
//!
//! | method | path | action |
//! |--------|------|--------|
//! | POST | `/test-single` | run a TAM test (form: `company_context`, `model_choice`) |
//! | POST | `/test-dcf` | run a DCF test (same form) |
//! | GET | `/results/{test_id}` | fetch one stored result |
//! | GET | `/export-results` | TAM results bundle |
//! | GET | `/export-dcf-results` | DCF results bundle |
//! | POST | `/export` | write a bundle to the export directory (form: `kind`, `path`) |
//! | GET | `/health` | liveness and configured models |
//!
//! Invalid input answers 400 with `{"success": false, "error": ...}`. A
//! provider failure is not an HTTP error: the test still completes and the
//! result carries the provider error kind.

mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use prompt_harness_db::HarnessConfig;
use prompt_harness_runner::ResultAssembler;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ServerError};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub assembler: Arc<ResultAssembler>,
    pub config: Arc<HarnessConfig>,
}

impl AppState {
    pub fn new(assembler: ResultAssembler, config: HarnessConfig) -> Self {
        Self {
            assembler: Arc::new(assembler),
            config: Arc::new(config),
        }
    }
}

/// Builds the router for `state`.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/test-single", post(routes::test_single))
        .route("/test-dcf", post(routes::test_dcf))
        .route("/results/{test_id}", get(routes::get_result))
        .route("/export-results", get(routes::export_tam))
        .route("/export-dcf-results", get(routes::export_dcf))
        .route("/export", post(routes::export_to_file))
        .route("/health", get(routes::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Serves the router on `addr` until Ctrl-C.
pub async fn serve(state: AppState, addr: &str) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!(address = %addr, "Prompt harness server starting");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Prompt harness server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}
