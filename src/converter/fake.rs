//! In-process converter for tests: writes `%PDF-1.4 <input name>` and records calls.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{ConvertError, ConverterStatus, DocumentConverter};

#[derive(Default)]
pub struct FakeConverter {
    pub fail_on: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentConverter for FakeConverter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
        let file_name = input.file_name().unwrap().to_string_lossy().to_string();
        self.calls.lock().unwrap().push(file_name.clone());

        if self.fail_on.as_deref() == Some(file_name.as_str()) {
            return Err(ConvertError::Failed {
                code: 1,
                stderr: "Error: source file could not be loaded".into(),
            });
        }

        let stem = input.file_stem().unwrap().to_string_lossy().to_string();
        let pdf = out_dir.join(format!("{}.pdf", stem));
        tokio::fs::write(&pdf, format!("%PDF-1.4 {}", file_name)).await?;
        Ok(pdf)
    }

    async fn status(&self) -> ConverterStatus {
        ConverterStatus {
            name: "fake".into(),
            available: true,
            version: None,
            detail: None,
        }
    }
}
