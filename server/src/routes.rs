use std::path::{Component, Path as FsPath};

use axum::Json;
use axum::extract::{Form, Path, State};
use chrono::Utc;
use prompt_harness_core::{AnalysisKind, AnalysisRequest, ModelId, ResultBundle, TestResult};
use prompt_harness_db::{ExportReceipt, default_export_name};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::AppState;
use crate::error::ApiError;

/// Form fields accepted by the test endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct TestForm {
    pub company_context: Option<String>,
    pub model_choice: Option<String>,
}

/// Form fields accepted by `POST /export`.
#[derive(Debug, Default, Deserialize)]
pub struct ExportForm {
    pub kind: Option<String>,
    /// File name inside the export directory.
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResultResponse {
    pub success: bool,
    pub result: TestResult,
}

#[derive(Debug, Serialize)]
pub struct BundleResponse {
    pub success: bool,
    #[serde(flatten)]
    pub bundle: ResultBundle,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub success: bool,
    #[serde(flatten)]
    pub receipt: ExportReceipt,
}

async fn run_test(
    state: &AppState,
    form: TestForm,
    kind: AnalysisKind,
) -> Result<Json<ResultResponse>, ApiError> {
    let model = form
        .model_choice
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(ModelId::Qwen.as_str());
    let request = AnalysisRequest::parse(form.company_context.as_deref(), model, kind)?;

    let result = state.assembler.run(request).await;
    Ok(Json(ResultResponse {
        success: true,
        result,
    }))
}

/// POST /test-single - run a TAM test
pub async fn test_single(
    State(state): State<AppState>,
    Form(form): Form<TestForm>,
) -> Result<Json<ResultResponse>, ApiError> {
    run_test(&state, form, AnalysisKind::Tam).await
}

/// POST /test-dcf - run a DCF test
pub async fn test_dcf(
    State(state): State<AppState>,
    Form(form): Form<TestForm>,
) -> Result<Json<ResultResponse>, ApiError> {
    run_test(&state, form, AnalysisKind::Dcf).await
}

/// GET /results/{test_id}
pub async fn get_result(
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<Json<ResultResponse>, ApiError> {
    debug!(test_id = %test_id, "Getting result");
    let result = state
        .assembler
        .store()
        .get(&test_id)
        .ok_or_else(|| ApiError::NotFound(format!("test result not found: {test_id}")))?;
    Ok(Json(ResultResponse {
        success: true,
        result,
    }))
}

/// GET /export-results - TAM bundle
pub async fn export_tam(State(state): State<AppState>) -> Json<BundleResponse> {
    Json(BundleResponse {
        success: true,
        bundle: state.assembler.store().bundle(Some(AnalysisKind::Tam)),
    })
}

/// GET /export-dcf-results - DCF bundle
pub async fn export_dcf(State(state): State<AppState>) -> Json<BundleResponse> {
    Json(BundleResponse {
        success: true,
        bundle: state.assembler.store().bundle(Some(AnalysisKind::Dcf)),
    })
}

/// POST /export - write a bundle into the export directory
pub async fn export_to_file(
    State(state): State<AppState>,
    Form(form): Form<ExportForm>,
) -> Result<Json<ExportResponse>, ApiError> {
    let kind = match form.kind.as_deref().map(str::trim) {
        None | Some("") | Some("all") => None,
        Some(kind) => Some(kind.parse::<AnalysisKind>()?),
    };
    let name = match form.path {
        Some(path) if !path.trim().is_empty() => path,
        _ => default_export_name(kind),
    };
    if !is_plain_relative(FsPath::new(&name)) {
        return Err(ApiError::BadRequest(format!(
            "export path must be relative to the export directory: {name}"
        )));
    }

    let path = state.config.results.export_dir.join(name);
    let store = state.assembler.store().clone();
    let receipt = tokio::task::spawn_blocking(move || store.export_to_file(kind, path))
        .await
        .map_err(|e| ApiError::Internal(format!("export task failed: {e}")))??;

    info!(path = %receipt.path.display(), total_tests = receipt.total_tests, "Export written");
    Ok(Json(ExportResponse {
        success: true,
        receipt,
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let providers = &state.config.providers;
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "models": {
            "qwen": providers.qwen.model,
            "gemini": providers.gemini.model,
        },
        "storedResults": state.assembler.store().len(),
    }))
}

fn is_plain_relative(path: &FsPath) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_)))
}
