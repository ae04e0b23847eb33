//! CatBoost-style gradient boosting on symmetric (oblivious) trees
//!
//! Every node at a given depth shares the same (feature, border) split, so a
//! tree of depth d is a list of d splits plus 2^d leaf values. Features are
//! quantized once into at most `border_count` borders before boosting.

use super::models::{check_fit_input, check_predict_width, Regressor};
use crate::error::{Result, ScorecastError};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostConfig {
    pub iterations: usize,
    pub learning_rate: f64,
    pub depth: usize,
    /// L2 regularization on leaf values
    pub l2_leaf_reg: f64,
    /// Maximum number of candidate borders per feature
    pub border_count: usize,
}

impl Default for CatBoostConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            learning_rate: 0.1,
            depth: 6,
            l2_leaf_reg: 3.0,
            border_count: 64,
        }
    }
}

/// Symmetric tree: each level uses the same split feature + threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymmetricTree {
    splits: Vec<(usize, f64)>,
    leaf_values: Vec<f64>,
}

impl SymmetricTree {
    fn predict(&self, sample: ArrayView1<f64>) -> f64 {
        let mut idx = 0usize;
        for &(feature, threshold) in &self.splits {
            idx = idx * 2 + usize::from(sample[feature] > threshold);
        }
        self.leaf_values[idx]
    }
}

/// Candidate borders per feature and every sample's bin under them
struct Quantized {
    borders: Vec<Vec<f64>>,
    /// bins[f][i] = number of borders of feature f strictly below x[i, f]
    bins: Vec<Vec<usize>>,
}

fn quantize(x: &Array2<f64>, border_count: usize) -> Quantized {
    let (borders, bins): (Vec<Vec<f64>>, Vec<Vec<usize>>) = (0..x.ncols())
        .into_par_iter()
        .map(|f| {
            let mut values: Vec<f64> = x.column(f).to_vec();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
            values.dedup();

            let cuts: Vec<f64> = values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect();
            let borders: Vec<f64> = if cuts.len() <= border_count {
                cuts
            } else {
                let mut picked: Vec<f64> = (1..=border_count)
                    .map(|k| cuts[k * cuts.len() / (border_count + 1)])
                    .collect();
                picked.dedup();
                picked
            };

            let bins = x
                .column(f)
                .iter()
                .map(|&v| borders.partition_point(|&b| b < v))
                .collect();
            (borders, bins)
        })
        .unzip();

    Quantized { borders, bins }
}

fn build_symmetric_tree(
    quantized: &Quantized,
    gradients: &[f64],
    depth: usize,
    l2: f64,
) -> SymmetricTree {
    let n = gradients.len();
    let mut splits: Vec<(usize, f64)> = Vec::with_capacity(depth);
    let mut leaf_of = vec![0usize; n];

    for level in 0..depth {
        let n_leaves = 1usize << level;

        // Hessian is 1 for squared error, so h is a plain count
        let best = (0..quantized.borders.len())
            .into_par_iter()
            .filter_map(|f| {
                let n_borders = quantized.borders[f].len();
                if n_borders == 0 {
                    return None;
                }
                let n_bins = n_borders + 1;
                let mut g_hist = vec![0.0f64; n_leaves * n_bins];
                let mut h_hist = vec![0.0f64; n_leaves * n_bins];
                for i in 0..n {
                    let slot = leaf_of[i] * n_bins + quantized.bins[f][i];
                    g_hist[slot] += gradients[i];
                    h_hist[slot] += 1.0;
                }

                let mut gains = vec![0.0f64; n_borders];
                for leaf in 0..n_leaves {
                    let g_row = &g_hist[leaf * n_bins..(leaf + 1) * n_bins];
                    let h_row = &h_hist[leaf * n_bins..(leaf + 1) * n_bins];
                    let g_total: f64 = g_row.iter().sum();
                    let h_total: f64 = h_row.iter().sum();
                    if h_total == 0.0 {
                        continue;
                    }
                    let parent = g_total * g_total / (h_total + l2);
                    let (mut gl, mut hl) = (0.0, 0.0);
                    for (b, gain) in gains.iter_mut().enumerate() {
                        gl += g_row[b];
                        hl += h_row[b];
                        let (gr, hr) = (g_total - gl, h_total - hl);
                        *gain += gl * gl / (hl + l2) + gr * gr / (hr + l2) - parent;
                    }
                }

                let mut best: Option<(usize, usize, f64)> = None;
                for (b, &gain) in gains.iter().enumerate() {
                    if gain > best.map_or(1e-12, |x| x.2) {
                        best = Some((f, b, gain));
                    }
                }
                best
            })
            .collect::<Vec<_>>()
            .into_iter()
            .fold(None, |best: Option<(usize, usize, f64)>, cand| match best {
                Some(b) if b.2 >= cand.2 => Some(b),
                _ => Some(cand),
            });

        match best {
            Some((f, b, _)) => {
                splits.push((f, quantized.borders[f][b]));
                for i in 0..n {
                    leaf_of[i] = leaf_of[i] * 2 + usize::from(quantized.bins[f][i] > b);
                }
            }
            None => break,
        }
    }

    let n_leaves = 1usize << splits.len();
    let mut g_sum = vec![0.0f64; n_leaves];
    let mut h_sum = vec![0.0f64; n_leaves];
    for i in 0..n {
        g_sum[leaf_of[i]] += gradients[i];
        h_sum[leaf_of[i]] += 1.0;
    }
    let leaf_values = g_sum
        .iter()
        .zip(h_sum.iter())
        .map(|(g, h)| -g / (h + l2))
        .collect();

    SymmetricTree {
        splits,
        leaf_values,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatBoostRegressor {
    pub config: CatBoostConfig,
    trees: Vec<SymmetricTree>,
    base_prediction: f64,
    n_features: usize,
}

impl CatBoostRegressor {
    pub fn new(config: CatBoostConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_prediction: 0.0,
            n_features: 0,
        }
    }
}

impl Regressor for CatBoostRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        if self.config.depth == 0 || self.config.depth > 16 {
            return Err(ScorecastError::InvalidParameter {
                name: "depth".to_string(),
                value: self.config.depth.to_string(),
                reason: "must be in 1..=16".to_string(),
            });
        }

        let n = x.nrows();
        self.n_features = x.ncols();
        self.base_prediction = y.mean().unwrap_or(0.0);
        self.trees.clear();

        let quantized = quantize(x, self.config.border_count.max(1));
        let mut predictions = Array1::from_elem(n, self.base_prediction);

        for _ in 0..self.config.iterations {
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(y.iter())
                .map(|(&p, &yi)| p - yi)
                .collect();

            let tree = build_symmetric_tree(
                &quantized,
                &gradients,
                self.config.depth,
                self.config.l2_leaf_reg,
            );
            for (i, row) in x.rows().into_iter().enumerate() {
                predictions[i] += self.config.learning_rate * tree.predict(row);
            }
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.n_features == 0 {
            return Err(ScorecastError::ModelNotFitted);
        }
        check_predict_width(x, self.n_features)?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| {
                self.base_prediction
                    + self
                        .trees
                        .iter()
                        .map(|t| self.config.learning_rate * t.predict(row))
                        .sum::<f64>()
            })
            .collect())
    }
}
