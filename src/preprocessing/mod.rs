//! Data preprocessing module
//!
//! Imputation, scaling and one-hot encoding composed into a single
//! `DataPreprocessor` that is fit on the training split and reused unchanged
//! for test and inference data.

mod config;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::PreprocessingConfig;
pub use encoder::OneHotEncoder;
pub use imputer::{ImputeStrategy, Imputer};
pub use pipeline::{numeric_matrix, DataPreprocessor};
pub use scaler::StandardScaler;
