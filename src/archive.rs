// ZIP bundling of converted PDFs

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::types::{AppError, AppResult};

/// A file to place in the bundle under `name`
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    pub source: PathBuf,
}

/// Write `entries` into a deflate-compressed ZIP at `path`, in order.
pub fn write_zip(path: &Path, entries: &[ArchiveEntry]) -> AppResult<u64> {
    let file = File::create(path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        zip.start_file(entry.name.as_str(), options)?;
        let mut source = File::open(&entry.source)?;
        io::copy(&mut source, &mut zip)?;
    }

    let writer = zip.finish()?;
    let file = writer.into_inner().map_err(|e| AppError::Io(e.into_error()))?;
    let size = file.metadata()?.len();

    info!(path = %path.display(), entries = entries.len(), size, "ZIP created");
    Ok(size)
}

/// Async wrapper running `write_zip` on the blocking pool.
pub async fn build_zip(path: PathBuf, entries: Vec<ArchiveEntry>) -> AppResult<u64> {
    tokio::task::spawn_blocking(move || write_zip(&path, &entries))
        .await
        .map_err(|e| AppError::Internal(format!("archive task failed: {}", e)))?
}
