// PDF Converter - converts uploaded office documents to PDF through LibreOffice

pub mod archive;
pub mod config;
pub mod converter;
pub mod local;
pub mod middleware;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod types;
pub mod utils;
pub mod workspace;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
