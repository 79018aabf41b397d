use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::converter::{ConverterStatus, DocumentConverter, LibreOfficeConverter};
use crate::pipeline::ConversionPipeline;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: ConversionPipeline,
}

impl AppState {
    /// State backed by the LibreOffice converter described in `config`.
    pub fn new(config: Config) -> Self {
        let converter = Arc::new(LibreOfficeConverter::new(&config.converter));
        Self::with_converter(config, converter)
    }

    pub fn with_converter(config: Config, converter: Arc<dyn DocumentConverter>) -> Self {
        Self {
            config,
            pipeline: ConversionPipeline::new(converter),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub converter: ConverterStatus,
}
