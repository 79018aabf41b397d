// Error types shared by the HTTP layer and the conversion pipeline

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::converter::ConvertError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("No files uploaded")]
    NoFiles,

    #[error("Unexpected field: {0}")]
    UnexpectedField(String),

    #[error("Too many files: at most {0} allowed per request")]
    TooManyFiles(usize),

    #[error("File {name} exceeds the {limit} byte limit")]
    FileTooLarge { name: String, limit: u64 },

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Invalid upload: {0}")]
    NotMultipart(#[from] MultipartRejection),

    #[error("Failed to convert {file}")]
    Conversion {
        file: String,
        #[source]
        source: ConvertError,
    },

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NoFiles | AppError::UnexpectedField(_) | AppError::TooManyFiles(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Multipart(e) => e.status(),
            AppError::NotMultipart(e) => e.status(),
            AppError::Conversion { source, .. } => match source {
                ConvertError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                ConvertError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                ConvertError::Failed { .. } | ConvertError::NoOutput | ConvertError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Archive(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            AppError::Conversion { file, source } => {
                tracing::error!(file = %file, error = %source, "Conversion failed");
                json!({
                    "error": self.to_string(),
                    "details": source.to_string(),
                    "status": status.as_u16(),
                })
            }
            AppError::Archive(_) | AppError::Io(_) | AppError::Internal(_) => {
                tracing::error!("Internal error: {}", self);
                json!({
                    "error": "Internal error",
                    "status": status.as_u16(),
                })
            }
            _ => {
                tracing::warn!("Rejected request: {}", self);
                json!({
                    "error": self.to_string(),
                    "status": status.as_u16(),
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
