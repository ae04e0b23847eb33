//! Preprocessing configuration

use serde::{Deserialize, Serialize};
use super::ImputeStrategy;

/// Column roles and imputation strategies for the preprocessor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Numeric predictors, scaled to zero mean and unit variance
    pub numerical_columns: Vec<String>,

    /// Categorical predictors, one-hot encoded then scaled without centering
    pub categorical_columns: Vec<String>,

    /// Column holding the regression target
    pub target_column: String,

    /// Strategy for handling missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for handling missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            numerical_columns: vec!["reading score".to_string(), "writing score".to_string()],
            categorical_columns: vec![
                "gender".to_string(),
                "race/ethnicity".to_string(),
                "parental level of education".to_string(),
                "lunch".to_string(),
                "test preparation course".to_string(),
            ],
            target_column: "math score".to_string(),
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
        }
    }
}

impl PreprocessingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set numeric columns
    pub fn with_numerical_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.numerical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set categorical columns
    pub fn with_categorical_columns<S: Into<String>>(
        mut self,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        self.categorical_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the target column
    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    /// Every predictor column, numeric first
    pub fn feature_columns(&self) -> Vec<&str> {
        self.numerical_columns
            .iter()
            .chain(self.categorical_columns.iter())
            .map(String::as_str)
            .collect()
    }
}
