//! `POST /api/files/convert`
//!
//! Accepts `multipart/form-data` with one or more `files` parts. Replies with
//! the converted PDF for a single upload, or `converted_files.zip` otherwise.

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tracing::{debug, info};

use crate::models::AppState;
use crate::pipeline::ConversionOutcome;
use crate::types::{AppError, AppResult};
use crate::utils::content_disposition;
use crate::workspace::Workspace;

/// Multipart field that carries the documents
pub const UPLOAD_FIELD: &str = "files";

/// Response header reporting how many documents were converted
pub const CONVERTED_COUNT_HEADER: &str = "x-converted-count";

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.upload.max_request_bytes();

    Router::new()
        .route("/api/files/convert", post(convert_files))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn convert_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    // Rejected before anything touches disk, and answered as JSON like every other error
    let multipart = multipart?;

    let mut workspace = Workspace::create(&state.config.upload.dir).await?;
    let result = stage_and_convert(&state, &mut workspace, multipart).await;
    workspace.close().await;

    Ok(outcome_response(result?))
}

async fn stage_and_convert(
    state: &AppState,
    workspace: &mut Workspace,
    mut multipart: Multipart,
) -> AppResult<ConversionOutcome> {
    let limits = &state.config.upload;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();

        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!(field = %field_name, "Ignoring non-file form field");
            continue;
        };

        if field_name != UPLOAD_FIELD {
            return Err(AppError::UnexpectedField(field_name));
        }
        if workspace.len() >= limits.max_files {
            return Err(AppError::TooManyFiles(limits.max_files));
        }

        workspace
            .stage(&file_name, field, limits.max_file_bytes)
            .await?;
    }

    info!(
        workspace = %workspace.id(),
        files = workspace.len(),
        "File conversion request received"
    );

    state.pipeline.run(workspace).await
}

fn outcome_response(outcome: ConversionOutcome) -> Response {
    let headers = [
        (header::CONTENT_TYPE, outcome.kind.content_type().to_string()),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&outcome.filename),
        ),
        (
            HeaderName::from_static(CONVERTED_COUNT_HEADER),
            outcome.converted.to_string(),
        ),
    ];

    (StatusCode::OK, headers, Body::from(outcome.body)).into_response()
}
