//! Conversion pipeline
//!
//! Takes the documents staged in a `Workspace`, converts them one after
//! another and packages the result:
//! - one document  -> the PDF itself
//! - several       -> `converted_files.zip` holding `<name>_converted.pdf` entries

use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

use crate::archive::{build_zip, ArchiveEntry};
use crate::converter::DocumentConverter;
use crate::types::{AppError, AppResult};
use crate::utils::{converted_name, UniqueNames};
use crate::workspace::{StagedDocument, Workspace};

pub const ZIP_DOWNLOAD_NAME: &str = "converted_files.zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Pdf,
    Zip,
}

impl OutcomeKind {
    pub fn content_type(&self) -> mime::Mime {
        match self {
            OutcomeKind::Pdf => mime::APPLICATION_PDF,
            OutcomeKind::Zip => "application/zip"
                .parse()
                .unwrap_or(mime::APPLICATION_OCTET_STREAM),
        }
    }
}

/// Finished result, fully read into memory so the workspace can go away
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub kind: OutcomeKind,
    pub filename: String,
    pub converted: usize,
    pub body: Bytes,
}

/// A document after conversion
#[derive(Debug, Clone)]
struct ConvertedDocument {
    original_name: String,
    pdf_path: PathBuf,
}

#[derive(Clone)]
pub struct ConversionPipeline {
    converter: Arc<dyn DocumentConverter>,
}

impl ConversionPipeline {
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self { converter }
    }

    pub fn converter(&self) -> &Arc<dyn DocumentConverter> {
        &self.converter
    }

    #[instrument(skip_all, fields(workspace = %workspace.id(), files = workspace.len()))]
    pub async fn run(&self, workspace: &Workspace) -> AppResult<ConversionOutcome> {
        if workspace.is_empty() {
            return Err(AppError::NoFiles);
        }

        let start = Instant::now();
        let mut converted = Vec::with_capacity(workspace.len());
        for document in workspace.documents() {
            converted.push(self.convert_one(document).await?);
        }

        let outcome = if let [single] = converted.as_slice() {
            ConversionOutcome {
                kind: OutcomeKind::Pdf,
                filename: converted_name(&single.original_name),
                converted: 1,
                body: Bytes::from(tokio::fs::read(&single.pdf_path).await?),
            }
        } else {
            let mut names = UniqueNames::new();
            let entries: Vec<ArchiveEntry> = converted
                .iter()
                .map(|doc| ArchiveEntry {
                    name: names.claim(&converted_name(&doc.original_name)),
                    source: doc.pdf_path.clone(),
                })
                .collect();

            let zip_path = workspace.path().join(ZIP_DOWNLOAD_NAME);
            build_zip(zip_path.clone(), entries).await?;

            ConversionOutcome {
                kind: OutcomeKind::Zip,
                filename: ZIP_DOWNLOAD_NAME.to_string(),
                converted: converted.len(),
                body: Bytes::from(tokio::fs::read(&zip_path).await?),
            }
        };

        info!(
            kind = ?outcome.kind,
            converted = outcome.converted,
            bytes = outcome.body.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Conversion finished"
        );
        Ok(outcome)
    }

    async fn convert_one(&self, document: &StagedDocument) -> AppResult<ConvertedDocument> {
        if document.is_pdf().await {
            info!(file = %document.original_name, "Upload is already a PDF, passing through");
            return Ok(ConvertedDocument {
                original_name: document.original_name.clone(),
                pdf_path: document.input_path.clone(),
            });
        }

        info!(
            file = %document.original_name,
            size = document.size,
            converter = self.converter.name(),
            "Converting document"
        );

        let pdf_path = self
            .converter
            .convert(&document.input_path, &document.output_dir)
            .await
            .map_err(|source| AppError::Conversion {
                file: document.original_name.clone(),
                source,
            })?;

        Ok(ConvertedDocument {
            original_name: document.original_name.clone(),
            pdf_path,
        })
    }
}
