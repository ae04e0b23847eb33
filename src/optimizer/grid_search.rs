//! Exhaustive grid search scored by k-fold cross-validation

use super::search_space::ParamSet;
use crate::error::{Result, ScorecastError};
use crate::training::{
    CVResults, CrossValidator, ModelCandidate, ModelKind, Regressor, TrainedModel,
};
use crate::utils::CancellationToken;
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Score of one grid point, or why it could not be scored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboResult {
    pub params: ParamSet,
    pub cv: Option<CVResults>,
    pub error: Option<String>,
}

impl ComboResult {
    pub fn mean_score(&self) -> Option<f64> {
        self.cv.as_ref().map(|cv| cv.mean_score)
    }
}

/// Outcome of searching one candidate's grid
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub best_params: ParamSet,
    /// Mean cross-validated R² of `best_params`
    pub best_score: f64,
    /// Refit on the whole training set with `best_params`
    pub best_estimator: TrainedModel,
    /// Every combination in enumeration order
    pub cv_results: Vec<ComboResult>,
}

struct Fold {
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_test: Array2<f64>,
    y_test: Array1<f64>,
}

/// Grid search over one registry candidate
pub struct GridSearchCV<'a> {
    name: &'a str,
    kind: ModelKind,
    combinations: Vec<ParamSet>,
    cv_folds: usize,
    random_state: u64,
    token: CancellationToken,
}

impl<'a> GridSearchCV<'a> {
    pub fn new(candidate: &'a ModelCandidate) -> Self {
        Self {
            name: &candidate.name,
            kind: candidate.kind,
            combinations: candidate.grid.combinations(),
            cv_folds: 3,
            random_state: 42,
            token: CancellationToken::new(),
        }
    }

    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Seed handed to every stochastic estimator built during the search
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    pub fn n_combinations(&self) -> usize {
        self.combinations.len()
    }

    /// Run the search and refit the winner.
    ///
    /// Fails with `CandidateFailed` when no combination could be scored and with
    /// `Cancelled` as soon as the token trips.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<SearchResult> {
        if self.combinations.is_empty() {
            return Err(ScorecastError::InvalidParameter {
                name: "grid".to_string(),
                value: "[]".to_string(),
                reason: format!("grid for '{}' has an empty axis", self.name),
            });
        }
        if x.nrows() != y.len() {
            return Err(ScorecastError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let splits = CrossValidator::k_fold(self.cv_folds).split(x.nrows())?;
        let folds: Vec<Fold> = splits
            .iter()
            .map(|s| Fold {
                x_train: x.select(Axis(0), &s.train_indices),
                y_train: y.select(Axis(0), &s.train_indices),
                x_test: x.select(Axis(0), &s.test_indices),
                y_test: y.select(Axis(0), &s.test_indices),
            })
            .collect();

        let n_folds = folds.len();
        let n_cells = self.combinations.len() * n_folds;

        let cells: Vec<Result<f64>> = (0..n_cells)
            .into_par_iter()
            .map(|cell| {
                self.token.check("grid search")?;
                let params = &self.combinations[cell / n_folds];
                let fold = &folds[cell % n_folds];
                let mut model = self.kind.build(params, self.random_state)?;
                model.fit(&fold.x_train, &fold.y_train)?;
                model.score(&fold.x_test, &fold.y_test)
            })
            .collect();

        if let Some(cancel) = cells
            .iter()
            .find_map(|c| match c {
                Err(ScorecastError::Cancelled(msg)) => Some(msg.clone()),
                _ => None,
            })
        {
            return Err(ScorecastError::Cancelled(cancel));
        }

        let cv_results: Vec<ComboResult> = self
            .combinations
            .iter()
            .zip(cells.chunks(n_folds))
            .map(|(params, fold_scores)| summarize(params, fold_scores))
            .collect();

        let mut best: Option<(usize, f64)> = None;
        for (i, combo) in cv_results.iter().enumerate() {
            if let Some(score) = combo.mean_score() {
                if best.map_or(true, |(_, b)| score > b) {
                    best = Some((i, score));
                }
            }
        }

        let (best_idx, best_score) = match best {
            Some(b) => b,
            None => {
                let reason = cv_results
                    .iter()
                    .find_map(|c| c.error.clone())
                    .unwrap_or_else(|| "no combination could be scored".to_string());
                return Err(ScorecastError::CandidateFailed {
                    name: self.name.to_string(),
                    reason,
                });
            }
        };

        let best_params = self.combinations[best_idx].clone();
        debug!(
            candidate = self.name,
            params = %best_params,
            cv_r2 = best_score,
            "refitting best combination"
        );

        self.token.check("refit")?;
        let mut best_estimator = self.kind.build(&best_params, self.random_state)?;
        best_estimator
            .fit(x, y)
            .map_err(|e| ScorecastError::CandidateFailed {
                name: self.name.to_string(),
                reason: format!("refit failed: {}", e),
            })?;

        Ok(SearchResult {
            best_params,
            best_score,
            best_estimator,
            cv_results,
        })
    }
}

fn summarize(params: &ParamSet, fold_scores: &[Result<f64>]) -> ComboResult {
    let mut scores = Vec::with_capacity(fold_scores.len());
    for (fold, score) in fold_scores.iter().enumerate() {
        match score {
            Ok(s) if s.is_finite() => scores.push(*s),
            Ok(s) => {
                return ComboResult {
                    params: params.clone(),
                    cv: None,
                    error: Some(format!("fold {} scored {}", fold, s)),
                }
            }
            Err(e) => {
                return ComboResult {
                    params: params.clone(),
                    cv: None,
                    error: Some(format!("fold {}: {}", fold, e)),
                }
            }
        }
    }
    ComboResult {
        params: params.clone(),
        cv: Some(CVResults::from_scores(scores)),
        error: None,
    }
}
