//! Feature transformation step: fit the preprocessor on train, apply to both splits

use crate::error::{Result, ScorecastError};
use crate::export::Artifact;
use crate::ingestion::load_csv;
use crate::preprocessing::{DataPreprocessor, PreprocessingConfig};
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTransformationConfig {
    pub preprocessor_path: PathBuf,
    pub preprocessing: PreprocessingConfig,
}

impl Default for DataTransformationConfig {
    fn default() -> Self {
        Self {
            preprocessor_path: PathBuf::from("artifacts").join("preprocessor.bin"),
            preprocessing: PreprocessingConfig::default(),
        }
    }
}

/// Output of the transformation step
#[derive(Debug, Clone)]
pub struct TransformedData {
    /// `[features | target]`
    pub train: Array2<f64>,
    /// `[features | target]`
    pub test: Array2<f64>,
    pub preprocessor_path: PathBuf,
    pub feature_names: Vec<String>,
}

pub struct DataTransformation {
    config: DataTransformationConfig,
}

impl DataTransformation {
    pub fn new(config: DataTransformationConfig) -> Self {
        Self { config }
    }

    /// Transform both split files and persist the fitted preprocessor
    pub fn initiate_data_transformation(
        &self,
        train_path: &Path,
        test_path: &Path,
    ) -> Result<TransformedData> {
        let train_df = load_csv(train_path)?;
        let test_df = load_csv(test_path)?;
        info!(
            train_rows = train_df.height(),
            test_rows = test_df.height(),
            "Read train and test data"
        );

        let (train, test, preprocessor) = self.transform_frames(&train_df, &test_df)?;
        preprocessor.save(&self.config.preprocessor_path)?;
        info!(path = %self.config.preprocessor_path.display(), "Saved preprocessing object");

        Ok(TransformedData {
            train,
            test,
            preprocessor_path: self.config.preprocessor_path.clone(),
            feature_names: preprocessor.feature_names().to_vec(),
        })
    }

    /// Same as `initiate_data_transformation`, on in-memory frames and without persisting
    pub fn transform_frames(
        &self,
        train_df: &DataFrame,
        test_df: &DataFrame,
    ) -> Result<(Array2<f64>, Array2<f64>, DataPreprocessor)> {
        let target = &self.config.preprocessing.target_column;
        let y_train = target_vector(train_df, target)?;
        let y_test = target_vector(test_df, target)?;

        info!("Applying preprocessing object on training and testing frames");
        let mut preprocessor = DataPreprocessor::new(self.config.preprocessing.clone());
        let x_train = preprocessor.fit_transform(train_df)?;
        let x_test = preprocessor.transform(test_df)?;

        let train = append_target(&x_train, &y_train)?;
        let test = append_target(&x_test, &y_test)?;
        Ok((train, test, preprocessor))
    }
}

fn target_vector(df: &DataFrame, target: &str) -> Result<Array1<f64>> {
    let column = df
        .column(target)
        .map_err(|_| ScorecastError::FeatureNotFound(target.to_string()))?;
    let cast = column.as_materialized_series().cast(&DataType::Float64)?;
    cast.f64()?
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                ScorecastError::DataError(format!("target '{}' is missing at row {}", target, i))
            })
        })
        .collect()
}

fn append_target(x: &Array2<f64>, y: &Array1<f64>) -> Result<Array2<f64>> {
    let y = y.view().insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[x.view(), y])?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::write_csv;

    fn frame(scores: &[i64]) -> DataFrame {
        let n = scores.len();
        let cycle = |opts: &[&str]| -> Vec<String> {
            (0..n).map(|i| opts[i % opts.len()].to_string()).collect()
        };
        df!(
            "gender" => cycle(&["female", "male"]),
            "race/ethnicity" => cycle(&["group A", "group B", "group C"]),
            "parental level of education" => cycle(&["high school", "some college"]),
            "lunch" => cycle(&["standard", "free/reduced"]),
            "test preparation course" => cycle(&["none", "completed"]),
            "math score" => scores.to_vec(),
            "reading score" => scores.iter().map(|s| s + 3).collect::<Vec<_>>(),
            "writing score" => scores.iter().map(|s| s - 2).collect::<Vec<_>>()
        )
        .unwrap()
    }

    #[test]
    fn test_target_is_last_column() {
        let step = DataTransformation::new(DataTransformationConfig::default());
        let (train, test, pre) = step
            .transform_frames(&frame(&[50, 60, 70, 80]), &frame(&[65, 75]))
            .unwrap();
        assert_eq!(train.ncols(), pre.feature_names().len() + 1);
        assert_eq!(train.ncols(), test.ncols());
        assert_eq!(train.column(train.ncols() - 1).to_vec(), vec![50.0, 60.0, 70.0, 80.0]);
        assert_eq!(test.column(test.ncols() - 1).to_vec(), vec![65.0, 75.0]);
    }

    #[test]
    fn test_missing_target() {
        let step = DataTransformation::new(DataTransformationConfig::default());
        let train = frame(&[50, 60]).drop("math score").unwrap();
        let err = step.transform_frames(&train, &frame(&[1])).unwrap_err();
        assert!(matches!(err, ScorecastError::FeatureNotFound(_)));
    }

    #[test]
    fn test_persists_preprocessor() {
        let dir = tempfile::tempdir().unwrap();
        let train_path = dir.path().join("train.csv");
        let test_path = dir.path().join("test.csv");
        write_csv(&mut frame(&[50, 60, 70, 80]), &train_path).unwrap();
        write_csv(&mut frame(&[55, 66]), &test_path).unwrap();

        let config = DataTransformationConfig {
            preprocessor_path: dir.path().join("out").join("preprocessor.bin"),
            ..Default::default()
        };
        let data = DataTransformation::new(config)
            .initiate_data_transformation(&train_path, &test_path)
            .unwrap();
        assert!(data.preprocessor_path.exists());
        assert_eq!(data.test.nrows(), 2);

        let pre = DataPreprocessor::load(&data.preprocessor_path).unwrap();
        assert_eq!(pre.feature_names(), data.feature_names.as_slice());
    }
}
