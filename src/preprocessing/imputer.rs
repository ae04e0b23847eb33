//! Missing value imputation strategies

use crate::error::{Result, ScorecastError};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with median (numeric only)
    Median,
    /// Replace with the most frequent value; ties go to the smallest value
    MostFrequent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Imputer for handling missing values.
///
/// Numeric columns come out as `Float64`, categorical ones as `String`; empty
/// strings count as missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: BTreeMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| ScorecastError::FeatureNotFound(col_name.to_string()))?;

            let fill_value = self.compute_fill_value(col_name, column.as_materialized_series())?;
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by imputing missing values
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ScorecastError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            let column = df
                .column(col_name)
                .map_err(|_| ScorecastError::FeatureNotFound(col_name.clone()))?;
            let filled = fill_series(column.as_materialized_series(), fill_value)?;
            result.with_column(filled)?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_fill_value(&self, col_name: &str, series: &Series) -> Result<ImputeValue> {
        match self.strategy {
            ImputeStrategy::Median => {
                let cast = series.cast(&DataType::Float64)?;
                let median = cast.f64()?.median().ok_or_else(|| {
                    ScorecastError::PreprocessingError(format!(
                        "column '{}' has no values to take a median of",
                        col_name
                    ))
                })?;
                Ok(ImputeValue::Numeric(median))
            }
            ImputeStrategy::MostFrequent => {
                let cast = series.cast(&DataType::String)?;
                let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
                for val in cast.str()?.into_iter().flatten().filter(|v| !v.is_empty()) {
                    *counts.entry(val).or_insert(0) += 1;
                }

                let mut mode: Option<(&str, usize)> = None;
                for (val, count) in counts {
                    if mode.map_or(true, |(_, best)| count > best) {
                        mode = Some((val, count));
                    }
                }
                let (mode, _) = mode.ok_or_else(|| {
                    ScorecastError::PreprocessingError(format!(
                        "column '{}' has no values to take a mode of",
                        col_name
                    ))
                })?;
                Ok(ImputeValue::String(mode.to_string()))
            }
        }
    }
}

fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
    match fill_value {
        ImputeValue::Numeric(v) => {
            let cast = series.cast(&DataType::Float64)?;
            let filled: Float64Chunked = cast
                .f64()?
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(*v)))
                .collect();
            Ok(filled.with_name(series.name().clone()).into_series())
        }
        ImputeValue::String(v) => {
            let cast = series.cast(&DataType::String)?;
            let filled: StringChunked = cast
                .str()?
                .into_iter()
                .map(|opt| match opt {
                    Some(s) if !s.is_empty() => Some(s),
                    _ => Some(v.as_str()),
                })
                .collect();
            Ok(filled.with_name(series.name().clone()).into_series())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_fills_nulls() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[Some(1.0), None, Some(3.0), Some(10.0)]).into(),
        ])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &["a"]).unwrap();
        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(1), Some(3.0));
        assert_eq!(col.null_count(), 0);
    }

    #[test]
    fn test_median_casts_integers() {
        let df = DataFrame::new(vec![Series::new("a".into(), &[Some(4i64), None, Some(2)]).into()])
            .unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &["a"]).unwrap();
        assert_eq!(result.column("a").unwrap().f64().unwrap().get(1), Some(3.0));
    }

    #[test]
    fn test_most_frequent_tie_goes_to_smallest() {
        let df = DataFrame::new(vec![Series::new(
            "c".into(),
            &[Some("b"), Some("a"), Some("b"), Some("a"), None, Some("")],
        )
        .into()])
        .unwrap();

        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df, &["c"]).unwrap();
        let col = result.column("c").unwrap().str().unwrap();
        assert_eq!(col.get(4), Some("a"));
        assert_eq!(col.get(5), Some("a"));
        assert_eq!(col.get(0), Some("b"));
    }

    #[test]
    fn test_missing_column() {
        let df = DataFrame::new(vec![Series::new("a".into(), &[1.0]).into()]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let err = imputer.fit(&df, &["b"]).unwrap_err();
        assert!(matches!(err, ScorecastError::FeatureNotFound(_)));
    }

    #[test]
    fn test_unfitted() {
        let df = DataFrame::new(vec![Series::new("a".into(), &[1.0]).into()]).unwrap();
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert!(matches!(imputer.transform(&df), Err(ScorecastError::ModelNotFitted)));
    }
}
