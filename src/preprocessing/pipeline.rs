//! Data preprocessing pipeline

use super::{
    config::PreprocessingConfig,
    encoder::OneHotEncoder,
    imputer::Imputer,
    scaler::StandardScaler,
};
use crate::error::{Result, ScorecastError};
use crate::export::{Artifact, ArtifactKind};
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Maps raw records to the numeric feature matrix the models consume.
///
/// Numeric columns: imputation, then standard scaling. Categorical columns:
/// imputation, one-hot encoding, then scaling without centering. Output
/// columns are the numeric block followed by the categorical block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPreprocessor {
    config: PreprocessingConfig,
    numeric_imputer: Imputer,
    categorical_imputer: Imputer,
    numeric_scaler: StandardScaler,
    encoder: OneHotEncoder,
    categorical_scaler: StandardScaler,
    feature_names: Vec<String>,
    is_fitted: bool,
    /// Timing: seconds spent in last fit call
    fit_time: Option<f64>,
}

impl Default for DataPreprocessor {
    fn default() -> Self {
        Self::new(PreprocessingConfig::default())
    }
}

impl DataPreprocessor {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self {
            numeric_imputer: Imputer::new(config.numeric_impute_strategy.clone()),
            categorical_imputer: Imputer::new(config.categorical_impute_strategy.clone()),
            numeric_scaler: StandardScaler::new(),
            encoder: OneHotEncoder::new(),
            categorical_scaler: StandardScaler::without_mean(),
            feature_names: Vec::new(),
            is_fitted: false,
            fit_time: None,
            config,
        }
    }

    pub fn config(&self) -> &PreprocessingConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn fit_time(&self) -> Option<f64> {
        self.fit_time
    }

    /// Output column names, available once fitted
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Learn every statistic from `df` (the training split only)
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let start = Instant::now();
        if df.height() == 0 {
            return Err(ScorecastError::PreprocessingError(
                "cannot fit the preprocessor on an empty table".to_string(),
            ));
        }

        let num_cols: Vec<&str> =
            self.config.numerical_columns.iter().map(String::as_str).collect();
        let cat_cols: Vec<&str> =
            self.config.categorical_columns.iter().map(String::as_str).collect();
        info!(numerical = ?num_cols, categorical = ?cat_cols, "Fitting preprocessor");

        let numeric = self.numeric_imputer.fit_transform(df, &num_cols)?;
        let numeric = numeric_matrix(&numeric, &num_cols)?;
        self.numeric_scaler.fit(&numeric)?;

        let categorical = self.categorical_imputer.fit_transform(df, &cat_cols)?;
        let encoded = self.encoder.fit_transform(&categorical, &cat_cols)?;
        self.categorical_scaler.fit(&encoded)?;

        self.feature_names = self
            .config
            .numerical_columns
            .iter()
            .cloned()
            .chain(self.encoder.feature_names())
            .collect();
        self.is_fitted = true;
        self.fit_time = Some(start.elapsed().as_secs_f64());

        debug!(n_features = self.feature_names.len(), "Preprocessor fitted");
        Ok(self)
    }

    /// Apply the fitted statistics; never refits
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ScorecastError::ModelNotFitted);
        }
        let num_cols = self.numeric_names();
        let cat_cols = self.categorical_names();

        let numeric = self.numeric_imputer.transform(df)?;
        let numeric = self
            .numeric_scaler
            .transform(&numeric_matrix(&numeric, &num_cols)?)?;

        let categorical = self.categorical_imputer.transform(df)?;
        let encoded = self.encoder.transform(&categorical)?;
        let encoded = self.categorical_scaler.transform(&encoded)?;

        Ok(concatenate(Axis(1), &[numeric.view(), encoded.view()])?)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    fn numeric_names(&self) -> Vec<&str> {
        self.config.numerical_columns.iter().map(String::as_str).collect()
    }

    fn categorical_names(&self) -> Vec<&str> {
        self.config.categorical_columns.iter().map(String::as_str).collect()
    }
}

impl Artifact for DataPreprocessor {
    const KIND: ArtifactKind = ArtifactKind::Preprocessor;
}

/// Numeric columns of `df` as a dense matrix; nulls are an error
pub fn numeric_matrix(df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
    let mut out = Array2::zeros((df.height(), columns.len()));
    for (j, col_name) in columns.iter().enumerate() {
        let column = df
            .column(col_name)
            .map_err(|_| ScorecastError::FeatureNotFound(col_name.to_string()))?;
        let cast = column.as_materialized_series().cast(&DataType::Float64)?;
        for (i, val) in cast.f64()?.into_iter().enumerate() {
            out[[i, j]] = val.ok_or_else(|| {
                ScorecastError::DataError(format!(
                    "column '{}' has a missing or non-numeric value at row {}",
                    col_name, i
                ))
            })?;
        }
    }
    Ok(out)
}
