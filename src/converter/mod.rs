//! Document-to-PDF converters
//!
//! The conversion itself always belongs to an external program. This module
//! defines the seam the pipeline talks to and the LibreOffice implementation
//! used in production:
//! - `DocumentConverter` - trait implemented by every backend
//! - `LibreOfficeConverter` - runs `soffice --headless --convert-to pdf`
//! - `run_command` - subprocess runner with a kill-on-timeout

pub mod command;
#[cfg(test)]
pub(crate) mod fake;
pub mod libreoffice;

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use command::{run_command, CommandOutput};
pub use libreoffice::LibreOfficeConverter;

#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Short backend name used in logs and the health report
    fn name(&self) -> &str;

    /// Convert `input` to PDF, writing into `out_dir`, and return the PDF path.
    async fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError>;

    /// Check whether the backend can currently run.
    async fn status(&self) -> ConverterStatus;
}

/// Availability report for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ConverterStatus {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("Converter is not available: {0}")]
    Unavailable(String),

    #[error("Converter timed out after {0}ms")]
    Timeout(u64),

    #[error("Converter exited with code {code}")]
    Failed { code: i32, stderr: String },

    #[error("Converter did not produce a PDF")]
    NoOutput,

    #[error("I/O error during conversion: {0}")]
    Io(#[from] std::io::Error),
}
