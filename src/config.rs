//! Run configuration, loadable from JSON

use crate::error::{Result, ScorecastError};
use crate::ingestion::DataIngestionConfig;
use crate::training::TrainerConfig;
use crate::transformation::DataTransformationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of a full training run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ingestion: DataIngestionConfig,
    pub transformation: DataTransformationConfig,
    pub trainer: TrainerConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON file; absent keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ScorecastError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            ScorecastError::ConfigError(format!("{}: {}", path.display(), e))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ScorecastError::ConfigError(e.to_string()))
    }

    /// Route every artifact into `dir`
    pub fn with_artifacts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.ingestion = self.ingestion.with_artifacts_dir(dir);
        self.transformation.preprocessor_path = dir.join("preprocessor.bin");
        self.trainer.trained_model_file_path = dir.join("model.bin");
        self
    }
}
