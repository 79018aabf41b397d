//! `pdf-converter convert`: run the conversion pipeline on local files.

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::AppState;
use crate::pipeline::ConversionOutcome;
use crate::workspace::Workspace;

/// Convert `files` and write the PDF or ZIP to disk.
///
/// Without `output`, the result lands in `default_dir` under the same name an
/// HTTP client would download (`<name>_converted.pdf` or `converted_files.zip`).
/// Returns the path written.
pub async fn convert_local(
    state: &AppState,
    files: &[PathBuf],
    output: Option<PathBuf>,
    default_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let mut workspace = Workspace::create(&std::env::temp_dir()).await?;
    let result = stage_and_convert(state, &mut workspace, files).await;
    workspace.close().await;
    let outcome = result?;

    let target = output.unwrap_or_else(|| default_dir.join(&outcome.filename));
    tokio::fs::write(&target, &outcome.body)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;

    info!(
        output = %target.display(),
        converted = outcome.converted,
        bytes = outcome.body.len(),
        "Wrote converted output"
    );
    Ok(target)
}

async fn stage_and_convert(
    state: &AppState,
    workspace: &mut Workspace,
    files: &[PathBuf],
) -> anyhow::Result<ConversionOutcome> {
    for path in files {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        workspace
            .stage_bytes(&name, data, state.config.upload.max_file_bytes)
            .await?;
    }

    Ok(state.pipeline.run(workspace).await?)
}
