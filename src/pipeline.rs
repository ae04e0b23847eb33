//! End-to-end training run: ingestion, transformation, model selection

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::ingestion::DataIngestion;
use crate::training::{ModelTrainer, TrainingObserver, TrainingOutcome};
use crate::transformation::DataTransformation;
use crate::utils::CancellationToken;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Result of a full run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub preprocessor_path: PathBuf,
    pub training: TrainingOutcome,
}

pub struct TrainPipeline {
    config: PipelineConfig,
    observer: Option<Arc<dyn TrainingObserver>>,
    token: Option<CancellationToken>,
}

impl TrainPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            observer: None,
            token: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn TrainingObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self) -> Result<PipelineOutcome> {
        let (train_path, test_path) =
            DataIngestion::new(self.config.ingestion.clone()).initiate_data_ingestion()?;

        let data = DataTransformation::new(self.config.transformation.clone())
            .initiate_data_transformation(&train_path, &test_path)?;
        info!(n_features = data.feature_names.len(), "Data transformation completed");

        let mut trainer = ModelTrainer::new(self.config.trainer.clone());
        if let Some(observer) = &self.observer {
            trainer = trainer.with_observer(observer.clone());
        }
        if let Some(token) = &self.token {
            trainer = trainer.with_cancellation(token.clone());
        }
        let training = trainer.initiate_model_trainer(&data.train, &data.test)?;

        info!(
            model = %training.best_model_name,
            test_r2 = training.test_r2,
            elapsed_secs = training.elapsed.as_secs_f64(),
            "Training pipeline completed"
        );
        Ok(PipelineOutcome {
            train_path,
            test_path,
            preprocessor_path: data.preprocessor_path,
            training,
        })
    }
}
