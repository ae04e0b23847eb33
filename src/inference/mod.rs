//! Prediction on new records with persisted artifacts

use crate::error::Result;
use crate::export::Artifact;
use crate::preprocessing::DataPreprocessor;
use crate::training::{Regressor, TrainedModel};
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Value used for a missing or empty categorical field
pub const UNKNOWN: &str = "Unknown";

/// One student as submitted for prediction; every field may be left out
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentRecord {
    pub gender: Option<String>,
    pub race_ethnicity: Option<String>,
    pub parental_level_of_education: Option<String>,
    pub lunch: Option<String>,
    pub test_preparation_course: Option<String>,
    pub reading_score: Option<f64>,
    pub writing_score: Option<f64>,
}

fn or_unknown(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => UNKNOWN,
    }
}

impl StudentRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-row table in the raw column layout, with defaults applied
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let df = df!(
            "gender" => [or_unknown(&self.gender)],
            "race/ethnicity" => [or_unknown(&self.race_ethnicity)],
            "parental level of education" => [or_unknown(&self.parental_level_of_education)],
            "lunch" => [or_unknown(&self.lunch)],
            "test preparation course" => [or_unknown(&self.test_preparation_course)],
            "reading score" => [self.reading_score.unwrap_or(0.0)],
            "writing score" => [self.writing_score.unwrap_or(0.0)]
        )?;
        Ok(df)
    }
}

/// Loads the persisted preprocessor and model and predicts
pub struct PredictPipeline {
    preprocessor: DataPreprocessor,
    model: TrainedModel,
}

impl PredictPipeline {
    pub fn new(preprocessor: DataPreprocessor, model: TrainedModel) -> Self {
        Self {
            preprocessor,
            model,
        }
    }

    pub fn load(model_path: impl AsRef<Path>, preprocessor_path: impl AsRef<Path>) -> Result<Self> {
        let model = TrainedModel::load(model_path.as_ref())?;
        let preprocessor = DataPreprocessor::load(preprocessor_path.as_ref())?;
        info!(
            model = %model.kind(),
            path = %model_path.as_ref().display(),
            "Loaded model and preprocessor"
        );
        Ok(Self::new(preprocessor, model))
    }

    /// Default artifact locations
    pub fn default_paths() -> (PathBuf, PathBuf) {
        let artifacts = PathBuf::from("artifacts");
        (artifacts.join("model.bin"), artifacts.join("preprocessor.bin"))
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Predict for a raw table with the training column layout
    pub fn predict(&self, features: &DataFrame) -> Result<Array1<f64>> {
        let x = self.preprocessor.transform(features)?;
        self.model.predict(&x)
    }

    pub fn predict_record(&self, record: &StudentRecord) -> Result<f64> {
        let predictions = self.predict(&record.to_dataframe()?)?;
        Ok(predictions[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let record = StudentRecord {
            gender: Some("female".to_string()),
            lunch: Some(String::new()),
            reading_score: Some(72.0),
            ..Default::default()
        };
        let df = record.to_dataframe().unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.column("lunch").unwrap().str().unwrap().get(0), Some("Unknown"));
        assert_eq!(df.column("gender").unwrap().str().unwrap().get(0), Some("female"));
        assert_eq!(
            df.column("race/ethnicity").unwrap().str().unwrap().get(0),
            Some("Unknown")
        );
        assert_eq!(df.column("writing score").unwrap().f64().unwrap().get(0), Some(0.0));
        assert_eq!(df.column("reading score").unwrap().f64().unwrap().get(0), Some(72.0));
    }

    #[test]
    fn test_record_from_partial_json() {
        let record: StudentRecord = serde_json::from_str(r#"{"gender": "male"}"#).unwrap();
        assert_eq!(record.gender.as_deref(), Some("male"));
        assert!(record.writing_score.is_none());
    }
}
