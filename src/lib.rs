//! scorecast - student exam-score regression pipeline
//!
//! This crate ingests the student performance dataset, preprocesses it,
//! selects the best of several regression models by grid-searched
//! cross-validation and persists the winner for inference.
//!
//! # Modules
//!
//! ## Pipeline stages
//! - [`ingestion`] - CSV loading and the seeded train/test split
//! - [`preprocessing`] - Imputation, scaling, one-hot encoding
//! - [`transformation`] - Fit the preprocessor and build `[features | target]` arrays
//! - [`training`] - Estimators, the model registry and the selection core
//! - [`inference`] - Prediction on new records
//! - [`pipeline`] - The whole training run end to end
//!
//! ## Support
//! - [`optimizer`] - Hyperparameter grids and grid search
//! - [`export`] - Versioned binary artifacts
//! - [`config`] - JSON run configuration
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Pipeline stages
pub mod ingestion;
pub mod preprocessing;
pub mod transformation;
pub mod training;
pub mod inference;
pub mod pipeline;

// Support
pub mod optimizer;
pub mod export;
pub mod config;
pub mod utils;
pub mod cli;

pub use error::{Result, ScorecastError};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::error::{Result, ScorecastError};
    pub use crate::export::Artifact;
    pub use crate::inference::{PredictPipeline, StudentRecord};
    pub use crate::optimizer::{GridSearchCV, ParamGrid, ParamSet, ParamValue};
    pub use crate::pipeline::TrainPipeline;
    pub use crate::preprocessing::{DataPreprocessor, PreprocessingConfig};
    pub use crate::training::{
        default_registry, ModelCandidate, ModelKind, ModelTrainer, Regressor, TrainedModel,
        TrainerConfig, TrainingObserver,
    };
    pub use crate::utils::CancellationToken;
}
