//! AdaBoost.R2 regressor
//!
//! Each round fits a shallow regression tree on a weighted bootstrap of the
//! training set, then raises the weight of samples with large relative error.
//! Prediction is the weighted median of the per-round predictions.

use super::decision_tree::DecisionTree;
use super::models::{check_fit_input, check_predict_width, Regressor};
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// AdaBoost Regressor (linear loss)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    /// Depth of each weak learner
    pub base_max_depth: usize,
    pub random_state: u64,
    estimators: Vec<DecisionTree>,
    estimator_weights: Vec<f64>,
    n_features: usize,
}

impl Default for AdaBoostRegressor {
    fn default() -> Self {
        Self::new(50, 1.0)
    }
}

impl AdaBoostRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            base_max_depth: 3,
            random_state: 42,
            estimators: Vec::new(),
            estimator_weights: Vec::new(),
            n_features: 0,
        }
    }

    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Number of rounds actually kept (boosting can stop early)
    pub fn n_fitted(&self) -> usize {
        self.estimators.len()
    }
}

impl Regressor for AdaBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if !(self.learning_rate > 0.0) {
            return Err(ScorecastError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        self.estimators.clear();
        self.estimator_weights.clear();

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut weights = vec![1.0 / n_samples as f64; n_samples];

        for _ in 0..self.n_estimators {
            let sampler = WeightedIndex::new(&weights)
                .map_err(|e| ScorecastError::ComputationError(format!("sample weights: {}", e)))?;
            let boot: Vec<usize> = (0..n_samples).map(|_| sampler.sample(&mut rng)).collect();

            let mut tree = DecisionTree::new().with_max_depth(Some(self.base_max_depth));
            tree.fit(&x.select(Axis(0), &boot), &y.select(Axis(0), &boot))?;

            let errors: Vec<f64> = tree
                .predict(x)?
                .iter()
                .zip(y.iter())
                .map(|(p, t)| (p - t).abs())
                .collect();
            let max_error = errors.iter().cloned().fold(0.0f64, f64::max);

            if max_error == 0.0 {
                // Perfect learner ends boosting
                self.estimators.push(tree);
                self.estimator_weights.push(1.0);
                break;
            }

            let loss: Vec<f64> = errors.iter().map(|e| e / max_error).collect();
            let estimator_error: f64 = loss.iter().zip(weights.iter()).map(|(l, w)| l * w).sum();

            if estimator_error <= 0.0 {
                self.estimators.push(tree);
                self.estimator_weights.push(1.0);
                break;
            }
            if estimator_error >= 0.5 {
                // Worse than chance: keep it only if nothing else exists
                if self.estimators.is_empty() {
                    self.estimators.push(tree);
                    self.estimator_weights.push(1.0);
                }
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            let estimator_weight = self.learning_rate * (1.0 / beta).ln();

            for (w, l) in weights.iter_mut().zip(loss.iter()) {
                *w *= beta.powf((1.0 - l) * self.learning_rate);
            }
            let total: f64 = weights.iter().sum();
            if !(total > 0.0) || !total.is_finite() {
                self.estimators.push(tree);
                self.estimator_weights.push(estimator_weight);
                break;
            }
            weights.iter_mut().for_each(|w| *w /= total);

            self.estimators.push(tree);
            self.estimator_weights.push(estimator_weight);
        }

        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.estimators.is_empty() {
            return Err(ScorecastError::ModelNotFitted);
        }
        check_predict_width(x, self.n_features)?;

        let per_round: Vec<Array1<f64>> = self
            .estimators
            .iter()
            .map(|e| e.predict(x))
            .collect::<Result<_>>()?;
        let half_total = 0.5 * self.estimator_weights.iter().sum::<f64>();

        let out = (0..x.nrows())
            .map(|i| {
                let mut pairs: Vec<(f64, f64)> = per_round
                    .iter()
                    .zip(self.estimator_weights.iter())
                    .map(|(p, &w)| (p[i], w))
                    .collect();
                pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

                let mut cumulative = 0.0;
                for &(value, w) in &pairs {
                    cumulative += w;
                    if cumulative >= half_total {
                        return value;
                    }
                }
                pairs[pairs.len() - 1].0
            })
            .collect();
        Ok(out)
    }
}
