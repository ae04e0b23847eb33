//! Training configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the model trainer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Where the selected model is persisted
    pub trained_model_file_path: PathBuf,

    /// Minimum test R² the selected model must reach
    pub quality_threshold: f64,

    /// Number of cross-validation folds used by grid search
    pub cv_folds: usize,

    /// Seed handed to every stochastic estimator
    pub random_state: u64,

    /// Restrict the registry to these candidate names (None = all)
    pub candidates: Option<Vec<String>>,

    /// Abort the run after this many seconds (None = no deadline)
    pub timeout_secs: Option<u64>,

    /// Worker threads for grid search (None = rayon's global pool)
    pub n_threads: Option<usize>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            trained_model_file_path: PathBuf::from("artifacts").join("model.bin"),
            quality_threshold: 0.6,
            cv_folds: 3,
            random_state: 42,
            candidates: None,
            timeout_secs: None,
            n_threads: None,
        }
    }
}

impl TrainerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the model artifact path
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trained_model_file_path = path.into();
        self
    }

    /// Builder method to set the quality gate
    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    /// Builder method to set the number of CV folds
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to restrict the candidate set
    pub fn with_candidates<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.candidates = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Builder method to set a run deadline
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Builder method to bound the worker pool
    pub fn with_n_threads(mut self, n: usize) -> Self {
        self.n_threads = Some(n);
        self
    }
}
