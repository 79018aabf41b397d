//! Per-request scratch space for uploads and converter output.
//!
//! Layout under `UPLOAD_DIR`:
//!
//! ```text
//! convert-XXXXXX/
//! ├── 1/
//! │   ├── in/report.docx
//! │   └── out/report.pdf
//! ├── 2/
//! │   ├── in/report.docx
//! │   └── out/report.pdf
//! └── converted_files.zip
//! ```
//!
//! Each upload gets its own numbered directory, so two uploads with the same
//! name never collide in LibreOffice's `--outdir`. Callers remove the tree with
//! [`Workspace::close`], which runs the deletion on the blocking pool. If a
//! workspace is dropped without closing (a cancelled request), `TempDir`
//! still removes it inline.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{AppError, AppResult};
use crate::utils::sanitize_filename;

/// One uploaded file written to disk and waiting for conversion
#[derive(Debug, Clone)]
pub struct StagedDocument {
    /// 1-based position in upload order
    pub index: usize,
    /// Client-supplied name after sanitizing
    pub original_name: String,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub size: u64,
}

impl StagedDocument {
    /// True when the upload is already a PDF (extension and magic bytes agree).
    pub async fn is_pdf(&self) -> bool {
        let has_extension = self
            .input_path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !has_extension {
            return false;
        }

        let mut magic = [0u8; 5];
        match fs::File::open(&self.input_path).await {
            Ok(mut file) => file.read_exact(&mut magic).await.is_ok() && &magic == b"%PDF-",
            Err(_) => false,
        }
    }
}

pub struct Workspace {
    id: Uuid,
    dir: TempDir,
    documents: Vec<StagedDocument>,
}

impl Workspace {
    /// Create a fresh workspace directory under `root`, creating `root` if needed.
    pub async fn create(root: &Path) -> AppResult<Self> {
        fs::create_dir_all(root).await?;

        let dir = tempfile::Builder::new().prefix("convert-").tempdir_in(root)?;
        let id = Uuid::new_v4();
        debug!(workspace = %id, path = %dir.path().display(), "Workspace created");

        Ok(Self {
            id,
            dir,
            documents: Vec::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn documents(&self) -> &[StagedDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Stream one upload to disk, rejecting it once it grows past `max_bytes`.
    pub async fn stage<S, E>(
        &mut self,
        name: &str,
        chunks: S,
        max_bytes: u64,
    ) -> AppResult<&StagedDocument>
    where
        S: Stream<Item = Result<Bytes, E>>,
        AppError: From<E>,
    {
        let index = self.documents.len() + 1;
        let original_name = sanitize_filename(name);

        let doc_dir = self.dir.path().join(index.to_string());
        let input_dir = doc_dir.join("in");
        let output_dir = doc_dir.join("out");
        fs::create_dir_all(&input_dir).await?;
        fs::create_dir_all(&output_dir).await?;

        let input_path = input_dir.join(&original_name);
        let mut file = fs::File::create(&input_path).await?;

        let mut size: u64 = 0;
        let mut chunks = std::pin::pin!(chunks);
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            size += chunk.len() as u64;
            if size > max_bytes {
                return Err(AppError::FileTooLarge {
                    name: original_name,
                    limit: max_bytes,
                });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(
            workspace = %self.id,
            index,
            file = %original_name,
            size,
            "Upload staged"
        );

        self.documents.push(StagedDocument {
            index,
            original_name,
            input_path,
            output_dir,
            size,
        });
        Ok(&self.documents[index - 1])
    }

    /// Stage an upload that is already in memory.
    pub async fn stage_bytes(
        &mut self,
        name: &str,
        data: impl Into<Bytes>,
        max_bytes: u64,
    ) -> AppResult<&StagedDocument> {
        let data = data.into();
        let chunks = futures::stream::once(async move { Ok::<_, AppError>(data) });
        self.stage(name, chunks, max_bytes).await
    }

    /// Delete the workspace tree without blocking the async worker.
    pub async fn close(self) {
        let id = self.id;
        let dir = self.dir;
        let path = dir.path().to_path_buf();

        match tokio::task::spawn_blocking(move || dir.close()).await {
            Ok(Ok(())) => debug!(workspace = %id, path = %path.display(), "Workspace removed"),
            Ok(Err(e)) => {
                warn!(workspace = %id, path = %path.display(), error = %e, "Failed to remove workspace")
            }
            Err(e) => warn!(workspace = %id, error = %e, "Workspace cleanup task failed"),
        }
    }
}
