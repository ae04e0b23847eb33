//! One-hot encoding of categorical columns

use crate::error::{Result, ScorecastError};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder.
///
/// Categories are learned per column and kept sorted, so output columns are
/// grouped by input column then ordered lexicographically. Values never seen
/// during fit encode to all zeros.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        let mut categories = Vec::with_capacity(columns.len());
        for col_name in columns {
            let series = string_column(df, col_name)?;
            let seen: BTreeSet<String> = series
                .str()?
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
            categories.push((col_name.to_string(), seen.into_iter().collect()));
        }

        self.categories = categories;
        self.is_fitted = true;
        Ok(self)
    }

    /// Encode into a dense matrix, one column per learned category
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ScorecastError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.n_outputs()));
        let mut offset = 0;
        for (col_name, cats) in &self.categories {
            let series = string_column(df, col_name)?;
            for (row, val) in series.str()?.into_iter().enumerate() {
                if let Some(pos) = val.and_then(|v| cats.binary_search_by(|c| c.as_str().cmp(v)).ok())
                {
                    out[[row, offset + pos]] = 1.0;
                }
            }
            offset += cats.len();
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn n_outputs(&self) -> usize {
        self.categories.iter().map(|(_, c)| c.len()).sum()
    }

    /// `"<column>_<category>"` for every output column
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(col, cats)| cats.iter().map(move |c| format!("{}_{}", col, c)))
            .collect()
    }
}

fn string_column(df: &DataFrame, col_name: &str) -> Result<Series> {
    let column = df
        .column(col_name)
        .map_err(|_| ScorecastError::FeatureNotFound(col_name.to_string()))?;
    Ok(column.as_materialized_series().cast(&DataType::String)?)
}
