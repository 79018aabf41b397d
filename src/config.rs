use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub converter: ConverterConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConverterConfig {
    /// Program invoked for each conversion (LibreOffice's `soffice`)
    pub program: PathBuf,
    /// Arguments placed before `--headless --convert-to pdf ...`
    pub extra_args: Vec<String>,
    pub timeout_ms: u64,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_file_bytes: u64,
    pub max_files: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
}

impl UploadConfig {
    /// Upper bound for a whole multipart request body.
    pub fn max_request_bytes(&self) -> usize {
        let files = self.max_file_bytes.saturating_mul(self.max_files as u64);
        usize::try_from(files.saturating_add(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            server: ServerConfig {
                port: parse_var(&lookup, "PORT", 5000)?,
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                cors_allowed_origins: lookup("CORS_ORIGIN")
                    .unwrap_or_else(|| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            converter: ConverterConfig {
                program: lookup("SOFFICE_PATH")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("soffice")),
                extra_args: lookup("SOFFICE_EXTRA_ARGS")
                    .map(|s| s.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default(),
                timeout_ms: parse_var(&lookup, "CONVERT_TIMEOUT_MS", 120_000)?,
                max_concurrent: parse_var(&lookup, "MAX_CONCURRENT_CONVERSIONS", 1)?,
            },
            upload: UploadConfig {
                dir: lookup("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("uploads")),
                max_file_bytes: parse_var(&lookup, "MAX_FILE_BYTES", 50 * 1024 * 1024)?,
                max_files: parse_var(&lookup, "MAX_FILES", 20)?,
            },
            logging: LoggingConfig {
                dir: lookup("LOG_DIR")
                    .filter(|s| !s.trim().is_empty())
                    .map(PathBuf::from),
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.converter.timeout_ms == 0 {
            bail!("CONVERT_TIMEOUT_MS must be greater than zero");
        }
        if self.converter.max_concurrent == 0 {
            bail!("MAX_CONCURRENT_CONVERSIONS must be greater than zero");
        }
        if self.upload.max_files == 0 {
            bail!("MAX_FILES must be greater than zero");
        }
        if self.upload.max_file_bytes == 0 {
            bail!("MAX_FILE_BYTES must be greater than zero");
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        _ => Ok(default),
    }
}
