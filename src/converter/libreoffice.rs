use async_trait::async_trait;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{run_command, ConvertError, ConverterStatus, DocumentConverter};
use crate::config::ConverterConfig;

const VERSION_CHECK_TIMEOUT_MS: u64 = 10_000;

/// Converts documents by shelling out to LibreOffice in headless mode.
///
/// LibreOffice refuses to run two instances against the same user profile,
/// so conversions queue on a semaphore sized by `max_concurrent`.
#[derive(Clone)]
pub struct LibreOfficeConverter {
    program: PathBuf,
    extra_args: Vec<String>,
    timeout_ms: u64,
    permits: Arc<Semaphore>,
}

impl LibreOfficeConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
            timeout_ms: config.timeout_ms,
            permits: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        }
    }

    fn conversion_args(&self, input: &Path, out_dir: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.extra_args.iter().map(OsString::from).collect();
        args.extend([
            OsString::from("--headless"),
            OsString::from("--convert-to"),
            OsString::from("pdf"),
            OsString::from("--outdir"),
            out_dir.as_os_str().to_owned(),
            input.as_os_str().to_owned(),
        ]);
        args
    }

    fn spawn_error(&self, e: std::io::Error) -> ConvertError {
        match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                ConvertError::Unavailable(format!("{}: {}", self.program.display(), e))
            }
            _ => ConvertError::Io(e),
        }
    }
}

#[async_trait]
impl DocumentConverter for LibreOfficeConverter {
    fn name(&self) -> &str {
        "libreoffice"
    }

    async fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ConvertError::Unavailable("converter is shutting down".to_string()))?;

        let args = self.conversion_args(input, out_dir);
        debug!(program = %self.program.display(), ?args, "Running converter");

        let output = run_command(&self.program, &args, self.timeout_ms)
            .await
            .map_err(|e| self.spawn_error(e))?;

        if output.timed_out {
            warn!(input = %input.display(), timeout_ms = self.timeout_ms, "Converter timed out");
            return Err(ConvertError::Timeout(self.timeout_ms));
        }

        if !output.success() {
            warn!(
                input = %input.display(),
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "Converter failed"
            );
            return Err(ConvertError::Failed {
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        debug!(stdout = %output.stdout.trim(), "Converter output");

        let pdf = find_pdf(out_dir, input).await?;
        info!(
            input = %input.display(),
            output = %pdf.display(),
            duration_ms = output.duration_ms,
            "PDF created"
        );
        Ok(pdf)
    }

    async fn status(&self) -> ConverterStatus {
        let mut args: Vec<OsString> = self.extra_args.iter().map(OsString::from).collect();
        args.push(OsString::from("--version"));
        let version_check = run_command(&self.program, &args, VERSION_CHECK_TIMEOUT_MS).await;

        let (available, version, detail) = match version_check {
            Ok(output) if output.success() => {
                let version = output
                    .stdout
                    .lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(str::to_string);
                (true, version, None)
            }
            Ok(output) => (false, None, Some(output.combined_output().trim().to_string())),
            Err(e) => (false, None, Some(self.spawn_error(e).to_string())),
        };

        ConverterStatus {
            name: self.name().to_string(),
            available,
            version,
            detail,
        }
    }
}

/// Locate the PDF the converter wrote for `input`.
///
/// LibreOffice names its output `<input stem>.pdf`; any other PDF in the
/// directory is accepted as a fallback.
pub async fn find_pdf(out_dir: &Path, input: &Path) -> Result<PathBuf, ConvertError> {
    let expected = input.file_stem().map(|stem| {
        let mut name = stem.to_os_string();
        name.push(".pdf");
        out_dir.join(name)
    });

    if let Some(expected) = &expected {
        if tokio::fs::metadata(expected).await.map(|m| m.is_file()).unwrap_or(false) {
            return Ok(expected.clone());
        }
    }

    let mut candidates = Vec::new();
    let mut dir = tokio::fs::read_dir(out_dir).await?;
    while let Some(entry) = dir.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf && entry.file_type().await?.is_file() {
            candidates.push(path);
        }
    }

    candidates.sort();
    candidates.into_iter().next().ok_or(ConvertError::NoOutput)
}
