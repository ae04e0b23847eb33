//! Raw data ingestion: read the source CSV and write the train/test split

use crate::error::{Result, ScorecastError};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where ingestion reads from and writes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataIngestionConfig {
    /// Source dataset
    pub source_path: PathBuf,
    /// Copy of the full raw table
    pub raw_data_path: PathBuf,
    pub train_data_path: PathBuf,
    pub test_data_path: PathBuf,
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed of the row permutation
    pub random_state: u64,
}

impl Default for DataIngestionConfig {
    fn default() -> Self {
        let artifacts = PathBuf::from("artifacts");
        Self {
            source_path: PathBuf::from("data").join("StudentsPerformance.csv"),
            raw_data_path: artifacts.join("data.csv"),
            train_data_path: artifacts.join("train.csv"),
            test_data_path: artifacts.join("test.csv"),
            test_size: 0.2,
            random_state: 93,
        }
    }
}

impl DataIngestionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the source CSV
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = path.into();
        self
    }

    /// Builder method to put every output under `dir`
    pub fn with_artifacts_dir(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.raw_data_path = dir.join("data.csv");
        self.train_data_path = dir.join("train.csv");
        self.test_data_path = dir.join("test.csv");
        self
    }

    /// Builder method to set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Builder method to set the split seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}

/// Read a headed CSV file
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(ScorecastError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        ));
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Write `df` as a headed CSV, creating parent directories
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ScorecastError::io(parent, e))?;
    }
    let mut file = File::create(path).map_err(|e| ScorecastError::io(path, e))?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Seeded shuffle split; the test side holds `ceil(n * test_size)` rows
pub fn train_test_split(
    df: &DataFrame,
    test_size: f64,
    random_state: u64,
) -> Result<(DataFrame, DataFrame)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(ScorecastError::ConfigError(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }
    let n = df.height();
    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(ScorecastError::DataError(format!(
            "cannot split {} rows with test_size {}",
            n, test_size
        )));
    }

    let mut indices: Vec<IdxSize> = (0..n as IdxSize).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(n_test);
    let train = df.take(&IdxCa::new("idx".into(), train_idx))?;
    let test = df.take(&IdxCa::new("idx".into(), test_idx))?;
    Ok((train, test))
}

/// Ingestion step of the training pipeline
#[derive(Debug, Clone, Default)]
pub struct DataIngestion {
    config: DataIngestionConfig,
}

impl DataIngestion {
    pub fn new(config: DataIngestionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DataIngestionConfig {
        &self.config
    }

    /// Read the source, persist raw/train/test copies and return the split paths
    pub fn initiate_data_ingestion(&self) -> Result<(PathBuf, PathBuf)> {
        info!(source = %self.config.source_path.display(), "Entered the data ingestion component");
        let mut df = load_csv(&self.config.source_path)?;
        info!(rows = df.height(), columns = df.width(), "Read the dataset");

        write_csv(&mut df, &self.config.raw_data_path)?;

        info!("Train-test split initiated");
        let (mut train, mut test) =
            train_test_split(&df, self.config.test_size, self.config.random_state)?;
        write_csv(&mut train, &self.config.train_data_path)?;
        write_csv(&mut test, &self.config.test_data_path)?;

        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            "Ingestion of data is completed"
        );
        Ok((
            self.config.train_data_path.clone(),
            self.config.test_data_path.clone(),
        ))
    }
}
