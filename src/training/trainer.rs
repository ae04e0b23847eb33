//! Model selection: search every candidate, score on the test set, gate, persist

use super::config::TrainerConfig;
use super::evaluation::{evaluate_models, select_best, EvaluationReport};
use super::models::{ModelMetrics, Regressor};
use super::observer::{TracingObserver, TrainingEvent, TrainingObserver};
use super::registry::{default_registry, select_candidates, ModelCandidate, TrainedModel};
use crate::error::{Result, ScorecastError};
use crate::export::Artifact;
use crate::optimizer::{GridSearchCV, ParamSet};
use crate::utils::{CancellationToken, ParallelConfig};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Grid-search summary for one surviving candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub name: String,
    pub best_params: ParamSet,
    pub cv_score: f64,
}

/// Everything a successful run produced
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub best_model_name: String,
    pub best_params: ParamSet,
    pub test_r2: f64,
    /// Test-set metrics of the selected model
    pub metrics: ModelMetrics,
    pub report: EvaluationReport,
    /// Candidates dropped during search or evaluation, with the reason
    pub skipped: Vec<(String, String)>,
    pub candidates: Vec<CandidateSummary>,
    pub model_path: PathBuf,
    pub model: TrainedModel,
    pub elapsed: Duration,
}

/// Runs the model-selection core over a registry
pub struct ModelTrainer {
    config: TrainerConfig,
    registry: Vec<ModelCandidate>,
    observer: Arc<dyn TrainingObserver>,
    token: CancellationToken,
}

impl ModelTrainer {
    /// Trainer over the default registry; `timeout_secs` becomes the run deadline
    pub fn new(config: TrainerConfig) -> Self {
        let token = match config.timeout_secs {
            Some(secs) => CancellationToken::with_timeout(Duration::from_secs(secs)),
            None => CancellationToken::new(),
        };
        Self {
            config,
            registry: default_registry(),
            observer: Arc::new(TracingObserver),
            token,
        }
    }

    pub fn with_registry(mut self, registry: Vec<ModelCandidate>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn TrainingObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace the token derived from `timeout_secs`
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Select, gate and persist the best model.
    ///
    /// Both arrays carry the target in their last column. Single-candidate
    /// failures are recorded in `skipped`; an empty report is `NoCandidates`
    /// and a winner under the threshold is `BelowThreshold`.
    pub fn initiate_model_trainer(
        &self,
        train_arr: &Array2<f64>,
        test_arr: &Array2<f64>,
    ) -> Result<TrainingOutcome> {
        let start = Instant::now();
        info!("Split training and test input data");
        let (x_train, y_train) = split_target(train_arr)?;
        let (x_test, y_test) = split_target(test_arr)?;
        if x_train.ncols() != x_test.ncols() {
            return Err(ScorecastError::ShapeError {
                expected: format!("{} test features", x_train.ncols()),
                actual: format!("{} test features", x_test.ncols()),
            });
        }

        let candidates = match &self.config.candidates {
            Some(names) => select_candidates(self.registry.clone(), names)?,
            None => self.registry.clone(),
        };

        let parallel = ParallelConfig {
            n_threads: self.config.n_threads,
        };
        let (mut fitted, candidates_summary, mut skipped) =
            parallel.install(|| self.search_all(&candidates, &x_train, &y_train))?;

        self.token.check("evaluation")?;
        let (report, excluded) = evaluate_models(&fitted, &x_test, &y_test)?;
        for (candidate, reason) in excluded {
            self.emit(TrainingEvent::CandidateSkipped {
                candidate: candidate.clone(),
                reason: reason.clone(),
            });
            skipped.push((candidate, reason));
        }
        for (candidate, test_r2) in report.iter() {
            self.emit(TrainingEvent::Evaluated {
                candidate: candidate.to_string(),
                test_r2,
            });
        }

        let (best_model_name, test_r2) =
            match select_best(&report, self.config.quality_threshold) {
                Ok(best) => best,
                Err(ScorecastError::BelowThreshold {
                    model,
                    score,
                    threshold,
                }) => {
                    self.emit(TrainingEvent::GateFailed {
                        candidate: model.clone(),
                        test_r2: score,
                        threshold,
                    });
                    return Err(ScorecastError::BelowThreshold {
                        model,
                        score,
                        threshold,
                    });
                }
                Err(e) => return Err(e),
            };
        self.emit(TrainingEvent::WinnerSelected {
            candidate: best_model_name.clone(),
            test_r2,
        });

        let winner_idx = fitted
            .iter()
            .position(|(name, _)| *name == best_model_name)
            .ok_or(ScorecastError::NoCandidates)?;
        let (_, model) = fitted.swap_remove(winner_idx);
        drop(fitted);

        let best_params = candidates_summary
            .iter()
            .find(|c| c.name == best_model_name)
            .map(|c| c.best_params.clone())
            .unwrap_or_default();

        let model_path = self.config.trained_model_file_path.clone();
        model.save(&model_path)?;
        self.emit(TrainingEvent::ModelSaved {
            path: model_path.clone(),
        });

        let predicted = model.predict(&x_test)?;
        let metrics = ModelMetrics::compute_regression(&y_test, &predicted)?;

        Ok(TrainingOutcome {
            best_model_name,
            best_params,
            test_r2,
            metrics,
            report,
            skipped,
            candidates: candidates_summary,
            model_path,
            model,
            elapsed: start.elapsed(),
        })
    }

    #[allow(clippy::type_complexity)]
    fn search_all(
        &self,
        candidates: &[ModelCandidate],
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
    ) -> Result<(
        Vec<(String, TrainedModel)>,
        Vec<CandidateSummary>,
        Vec<(String, String)>,
    )> {
        let mut fitted = Vec::with_capacity(candidates.len());
        let mut summaries = Vec::with_capacity(candidates.len());
        let mut skipped = Vec::new();

        for candidate in candidates {
            self.token.check("training")?;
            let search = GridSearchCV::new(candidate)
                .with_cv_folds(self.config.cv_folds)
                .with_random_state(self.config.random_state)
                .with_cancellation(self.token.clone());
            self.emit(TrainingEvent::SearchStarted {
                candidate: candidate.name.clone(),
                n_combinations: search.n_combinations(),
            });

            match search.fit(x_train, y_train) {
                Ok(result) => {
                    self.emit(TrainingEvent::BestParams {
                        candidate: candidate.name.clone(),
                        params: result.best_params.to_string(),
                        cv_score: result.best_score,
                    });
                    summaries.push(CandidateSummary {
                        name: candidate.name.clone(),
                        best_params: result.best_params,
                        cv_score: result.best_score,
                    });
                    fitted.push((candidate.name.clone(), result.best_estimator));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    self.emit(TrainingEvent::CandidateSkipped {
                        candidate: candidate.name.clone(),
                        reason: e.to_string(),
                    });
                    skipped.push((candidate.name.clone(), e.to_string()));
                }
            }
        }

        Ok((fitted, summaries, skipped))
    }

    fn emit(&self, event: TrainingEvent) {
        self.observer.on_event(&event);
    }
}

/// Split a combined `[features | target]` array
pub fn split_target(arr: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    let n_cols = arr.ncols();
    if n_cols < 2 {
        return Err(ScorecastError::ShapeError {
            expected: "at least one feature column plus the target".to_string(),
            actual: format!("{} columns", n_cols),
        });
    }
    if arr.nrows() == 0 {
        return Err(ScorecastError::DataError("empty array".to_string()));
    }
    let x = arr.slice(s![.., ..n_cols - 1]).to_owned();
    let y = arr.column(n_cols - 1).to_owned();
    Ok((x, y))
}
