//! Read-only and administrative HTTP endpoints.

use crate::defaults;
use crate::models::ModelSize;
use crate::server::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Service health report.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
    pub active_sessions: usize,
    pub model_loaded: bool,
}

/// Active-session counters.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub active_sessions: usize,
    pub max_sessions: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: crate::version_string(),
        backend: defaults::gpu_backend().to_string(),
        active_sessions: state.manager.active_sessions().await,
        model_loaded: state.manager.models().any_loaded().await,
    })
}

/// GET /sessions
pub async fn sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        active_sessions: state.manager.active_sessions().await,
        max_sessions: state.manager.max_sessions(),
    })
}

/// POST /models/{model}/load: administrative warm-up outside any session.
pub async fn load_model(
    State(state): State<AppState>,
    Path(model): Path<String>,
) -> impl IntoResponse {
    let model: ModelSize = match model.parse() {
        Ok(model) => model,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "error": e.to_string() })),
            );
        }
    };

    match state.manager.models().get_or_load(model).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "loaded", "model": model.as_str() })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "error": e.to_string() })),
        ),
    }
}
