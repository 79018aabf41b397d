use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::models::{AppState, HealthResponse};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .with_state(state)
}

/// Reports 503 while the converter program cannot be run.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let converter = state.pipeline.converter().status().await;

    let (status, code) = if converter.available {
        ("ok", StatusCode::OK)
    } else {
        ("degraded", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        converter,
    };

    (code, Json(response))
}
