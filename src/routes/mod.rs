//! API Routes
//!
//! - `/api/files/convert` - Upload documents and receive PDF/ZIP
//! - `/api/health` - Health check including converter availability

pub mod convert;
pub mod health;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::{apply_cors, apply_security_headers};
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let origins = state.config.server.cors_allowed_origins.clone();

    let router = Router::new()
        .merge(convert::router(state.clone()))
        .merge(health::router(state));

    let router = apply_security_headers(router);
    apply_cors(router, &origins).layer(TraceLayer::new_for_http())
}
