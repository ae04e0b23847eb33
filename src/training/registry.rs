//! Model catalog: which estimators compete and over which grids

use super::adaboost::AdaBoostRegressor;
use super::catboost::{CatBoostConfig, CatBoostRegressor};
use super::decision_tree::DecisionTree;
use super::knn::KNNRegressor;
use super::linear_models::{LassoRegression, LinearRegression, RidgeRegression};
use super::models::Regressor;
use super::random_forest::RandomForest;
use super::xgboost::{XGBoostConfig, XGBoostRegressor};
use crate::error::{Result, ScorecastError};
use crate::optimizer::{ParamGrid, ParamSet};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimator family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    LinearRegression,
    Lasso,
    Ridge,
    KNeighbors,
    DecisionTree,
    RandomForest,
    XGBoost,
    CatBoost,
    AdaBoost,
}

impl ModelKind {
    /// Untrained estimator for one grid point.
    ///
    /// Parameters the family does not know, or values of the wrong type, are
    /// `InvalidParameter`.
    pub fn build(&self, params: &ParamSet, seed: u64) -> Result<TrainedModel> {
        let model = match self {
            ModelKind::LinearRegression => {
                params.ensure_only(&[])?;
                TrainedModel::Linear(LinearRegression::new())
            }
            ModelKind::Lasso => {
                params.ensure_only(&["alpha"])?;
                TrainedModel::Lasso(LassoRegression::new(params.float_or("alpha", 1.0)?))
            }
            ModelKind::Ridge => {
                params.ensure_only(&["alpha"])?;
                TrainedModel::Ridge(RidgeRegression::new(params.float_or("alpha", 1.0)?))
            }
            ModelKind::KNeighbors => {
                params.ensure_only(&["n_neighbors"])?;
                TrainedModel::KNeighbors(KNNRegressor::with_k(params.usize_or("n_neighbors", 5)?))
            }
            ModelKind::DecisionTree => {
                params.ensure_only(&["max_depth"])?;
                TrainedModel::DecisionTree(
                    DecisionTree::new().with_max_depth(params.opt_usize("max_depth")?),
                )
            }
            ModelKind::RandomForest => {
                params.ensure_only(&["n_estimators", "max_depth"])?;
                TrainedModel::RandomForest(
                    RandomForest::new(params.usize_or("n_estimators", 100)?)
                        .with_max_depth(params.opt_usize("max_depth")?)
                        .with_random_state(seed),
                )
            }
            ModelKind::XGBoost => {
                params.ensure_only(&["n_estimators", "learning_rate", "max_depth"])?;
                TrainedModel::XGBoost(XGBoostRegressor::new(XGBoostConfig {
                    n_estimators: params.usize_or("n_estimators", 100)?,
                    learning_rate: params.float_or("learning_rate", 0.3)?,
                    max_depth: params.usize_or("max_depth", 6)?,
                    random_state: seed,
                    ..Default::default()
                }))
            }
            ModelKind::CatBoost => {
                params.ensure_only(&["iterations", "depth", "learning_rate"])?;
                TrainedModel::CatBoost(CatBoostRegressor::new(CatBoostConfig {
                    iterations: params.usize_or("iterations", 100)?,
                    depth: params.usize_or("depth", 6)?,
                    learning_rate: params.float_or("learning_rate", 0.1)?,
                    ..Default::default()
                }))
            }
            ModelKind::AdaBoost => {
                params.ensure_only(&["n_estimators", "learning_rate"])?;
                TrainedModel::AdaBoost(
                    AdaBoostRegressor::new(
                        params.usize_or("n_estimators", 50)?,
                        params.float_or("learning_rate", 1.0)?,
                    )
                    .with_random_state(seed),
                )
            }
        };
        Ok(model)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelKind::LinearRegression => "linear_regression",
            ModelKind::Lasso => "lasso",
            ModelKind::Ridge => "ridge",
            ModelKind::KNeighbors => "k_neighbors",
            ModelKind::DecisionTree => "decision_tree",
            ModelKind::RandomForest => "random_forest",
            ModelKind::XGBoost => "xgboost",
            ModelKind::CatBoost => "catboost",
            ModelKind::AdaBoost => "adaboost",
        };
        write!(f, "{}", s)
    }
}

/// A fitted (or ready-to-fit) estimator of any family.
///
/// This is the closed set that can be persisted; it dispatches `Regressor` to
/// the concrete model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedModel {
    Linear(LinearRegression),
    Lasso(LassoRegression),
    Ridge(RidgeRegression),
    KNeighbors(KNNRegressor),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
    XGBoost(XGBoostRegressor),
    CatBoost(CatBoostRegressor),
    AdaBoost(AdaBoostRegressor),
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::Linear(_) => ModelKind::LinearRegression,
            TrainedModel::Lasso(_) => ModelKind::Lasso,
            TrainedModel::Ridge(_) => ModelKind::Ridge,
            TrainedModel::KNeighbors(_) => ModelKind::KNeighbors,
            TrainedModel::DecisionTree(_) => ModelKind::DecisionTree,
            TrainedModel::RandomForest(_) => ModelKind::RandomForest,
            TrainedModel::XGBoost(_) => ModelKind::XGBoost,
            TrainedModel::CatBoost(_) => ModelKind::CatBoost,
            TrainedModel::AdaBoost(_) => ModelKind::AdaBoost,
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            TrainedModel::Linear(m) => m,
            TrainedModel::Lasso(m) => m,
            TrainedModel::Ridge(m) => m,
            TrainedModel::KNeighbors(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::XGBoost(m) => m,
            TrainedModel::CatBoost(m) => m,
            TrainedModel::AdaBoost(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            TrainedModel::Linear(m) => m,
            TrainedModel::Lasso(m) => m,
            TrainedModel::Ridge(m) => m,
            TrainedModel::KNeighbors(m) => m,
            TrainedModel::DecisionTree(m) => m,
            TrainedModel::RandomForest(m) => m,
            TrainedModel::XGBoost(m) => m,
            TrainedModel::CatBoost(m) => m,
            TrainedModel::AdaBoost(m) => m,
        }
    }
}

impl Regressor for TrainedModel {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }
}

/// A named registry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelCandidate {
    pub name: String,
    pub kind: ModelKind,
    pub grid: ParamGrid,
}

impl ModelCandidate {
    pub fn new(name: impl Into<String>, kind: ModelKind, grid: ParamGrid) -> Self {
        Self {
            name: name.into(),
            kind,
            grid,
        }
    }
}

/// The full catalog, in the order candidates are trained and reported
pub fn default_registry() -> Vec<ModelCandidate> {
    vec![
        ModelCandidate::new("Linear Regression", ModelKind::LinearRegression, ParamGrid::new()),
        ModelCandidate::new(
            "Lasso",
            ModelKind::Lasso,
            ParamGrid::new().param("alpha", [0.1, 1.0, 10.0]),
        ),
        ModelCandidate::new(
            "Ridge",
            ModelKind::Ridge,
            ParamGrid::new().param("alpha", [0.1, 1.0, 10.0]),
        ),
        ModelCandidate::new(
            "K-Neighbors Regressor",
            ModelKind::KNeighbors,
            ParamGrid::new().param("n_neighbors", [3i64, 5, 7, 9]),
        ),
        ModelCandidate::new(
            "Decision Tree",
            ModelKind::DecisionTree,
            ParamGrid::new().param("max_depth", [None, Some(10i64), Some(20), Some(30)]),
        ),
        ModelCandidate::new(
            "Random Forest Regressor",
            ModelKind::RandomForest,
            ParamGrid::new()
                .param("n_estimators", [100i64, 200])
                .param("max_depth", [None, Some(10i64), Some(20)]),
        ),
        ModelCandidate::new(
            "XGBRegressor",
            ModelKind::XGBoost,
            ParamGrid::new()
                .param("n_estimators", [100i64, 200])
                .param("learning_rate", [0.01, 0.1, 0.3]),
        ),
        ModelCandidate::new(
            "CatBoosting Regressor",
            ModelKind::CatBoost,
            ParamGrid::new()
                .param("iterations", [100i64, 200])
                .param("depth", [6i64, 8, 10]),
        ),
        ModelCandidate::new(
            "AdaBoost Regressor",
            ModelKind::AdaBoost,
            ParamGrid::new()
                .param("n_estimators", [50i64, 100])
                .param("learning_rate", [0.01, 0.1, 1.0]),
        ),
    ]
}

/// Keep only the named candidates, in registry order
pub fn select_candidates(
    registry: Vec<ModelCandidate>,
    names: &[String],
) -> Result<Vec<ModelCandidate>> {
    if let Some(unknown) = names
        .iter()
        .find(|n| !registry.iter().any(|c| &c.name == *n))
    {
        return Err(ScorecastError::ConfigError(format!(
            "unknown candidate '{}'",
            unknown
        )));
    }
    Ok(registry
        .into_iter()
        .filter(|c| names.contains(&c.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::HashSet;

    #[test]
    fn test_registry_names_unique() {
        let registry = default_registry();
        let names: HashSet<&str> = registry.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), registry.len());
        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_every_grid_point_builds() {
        for candidate in default_registry() {
            for params in candidate.grid.combinations() {
                let model = candidate.kind.build(&params, 0).unwrap();
                assert_eq!(model.kind(), candidate.kind);
            }
        }
    }

    #[test]
    fn test_build_rejects_foreign_param() {
        let params = ParamSet::new().with("n_neighbors", 3i64);
        let err = ModelKind::Ridge.build(&params, 0).unwrap_err();
        assert!(matches!(err, ScorecastError::InvalidParameter { .. }));
    }

    #[test]
    fn test_trained_model_dispatch() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![3.0, 5.0, 7.0, 9.0];
        let mut model = ModelKind::LinearRegression
            .build(&ParamSet::new(), 0)
            .unwrap();
        model.fit(&x, &y).unwrap();
        assert!(model.score(&x, &y).unwrap() > 0.999);
    }

    #[test]
    fn test_select_candidates() {
        let picked =
            select_candidates(default_registry(), &["Ridge".to_string(), "Lasso".to_string()])
                .unwrap();
        let names: Vec<&str> = picked.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Lasso", "Ridge"]);

        assert!(select_candidates(default_registry(), &["SVM".to_string()]).is_err());
    }
}
