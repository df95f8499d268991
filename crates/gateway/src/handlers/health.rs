//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use studyshelf_common::cache::CacheStatus;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Serialize)]
pub struct HealthChecks {
    pub dataset: CheckResult,
    pub cache: CacheStatus,
}

#[derive(Serialize)]
pub struct CheckResult {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Liveness probe - always returns healthy if server is running
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: studyshelf_common::VERSION.to_string(),
    })
}

/// Readiness probe - the mandatory dataset must be reachable
pub async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let dataset_path = state.catalog.paths().local_dataset.clone();

    let dataset_check = match tokio::fs::metadata(&dataset_path).await {
        Ok(meta) if meta.is_file() => CheckResult {
            status: "up".to_string(),
            error: None,
        },
        Ok(_) => CheckResult {
            status: "down".to_string(),
            error: Some("dataset path is not a file".to_string()),
        },
        Err(e) => {
            tracing::warn!(path = %dataset_path.display(), error = %e, "Dataset not reachable");
            CheckResult {
                status: "down".to_string(),
                error: Some(e.kind().to_string()),
            }
        }
    };

    let all_healthy = dataset_check.status == "up";
    let status = if all_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };

    (
        status,
        Json(ReadyResponse {
            status: if all_healthy { "ready" } else { "not_ready" }.to_string(),
            checks: HealthChecks {
                dataset: dataset_check,
                cache: state.catalog.cache_status().await,
            },
        }),
    )
}
