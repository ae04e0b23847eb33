//! Error types for the scorecast pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for scorecast operations
pub type Result<T> = std::result::Result<T, ScorecastError>;

/// Main error type for the pipeline
///
/// Candidate-level failures (`CandidateFailed`) are recorded by the trainer and
/// never abort a run on their own. `NoCandidates` and `BelowThreshold` are both
/// fatal but kept apart so callers can tell "nothing trained" from "nothing good
/// enough".
#[derive(Error, Debug)]
pub enum ScorecastError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Candidate '{name}' failed: {reason}")]
    CandidateFailed { name: String, reason: String },

    #[error("No candidate model survived training")]
    NoCandidates,

    #[error("Best model '{model}' scored {score:.4}, below the required {threshold:.4}")]
    BelowThreshold {
        model: String,
        score: f64,
        threshold: f64,
    },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error at {path}: {message}")]
    Serialization { path: PathBuf, message: String },

    #[error("Incompatible artifact at {path}: {reason}")]
    IncompatibleArtifact { path: PathBuf, reason: String },

    #[error("Run cancelled: {0}")]
    Cancelled(String),
}

impl ScorecastError {
    /// Wrap an IO error together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScorecastError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors that end the whole run rather than one candidate
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ScorecastError::CandidateFailed { .. }
                | ScorecastError::InvalidParameter { .. }
                | ScorecastError::ComputationError(_)
                | ScorecastError::ModelNotFitted
        )
    }
}

impl From<polars::error::PolarsError> for ScorecastError {
    fn from(err: polars::error::PolarsError) -> Self {
        ScorecastError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ScorecastError {
    fn from(err: ndarray::ShapeError) -> Self {
        ScorecastError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScorecastError::DataError("test error".to_string());
        assert_eq!(err.to_string(), "Data error: test error");
    }

    #[test]
    fn test_io_error_keeps_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ScorecastError::io("artifacts/model.bin", io_err);
        assert!(err.to_string().contains("artifacts/model.bin"));
        assert!(matches!(err, ScorecastError::Io { .. }));
    }

    #[test]
    fn test_gate_and_empty_are_distinct() {
        let gate = ScorecastError::BelowThreshold {
            model: "Ridge".to_string(),
            score: 0.5,
            threshold: 0.6,
        };
        assert!(gate.is_fatal());
        assert!(ScorecastError::NoCandidates.is_fatal());
        assert!(!matches!(gate, ScorecastError::NoCandidates));
        assert!(gate.to_string().contains("Ridge"));
    }

    #[test]
    fn test_candidate_failure_is_not_fatal() {
        let err = ScorecastError::CandidateFailed {
            name: "Lasso".to_string(),
            reason: "singular".to_string(),
        };
        assert!(!err.is_fatal());
    }
}
