//! Model training module
//!
//! Provides the regression estimators that compete during model selection:
//! - Linear models (OLS, Ridge, Lasso)
//! - K-Nearest Neighbors
//! - Decision trees and Random Forests
//! - XGBoost, CatBoost and AdaBoost style boosting
//!
//! and the selection core built on top of them (`ModelTrainer`).

mod config;
mod evaluation;
mod models;
mod observer;
mod registry;
mod trainer;
pub mod adaboost;
pub mod catboost;
pub mod cross_validation;
pub mod decision_tree;
pub mod knn;
pub mod linear_models;
pub mod random_forest;
pub mod xgboost;

pub use config::TrainerConfig;
pub use evaluation::{evaluate_models, select_best, EvaluationReport};
pub use models::{r2_score, ModelMetrics, Regressor};
pub use observer::{RecordingObserver, TracingObserver, TrainingEvent, TrainingObserver};
pub use registry::{default_registry, select_candidates, ModelCandidate, ModelKind, TrainedModel};
pub use trainer::{split_target, CandidateSummary, ModelTrainer, TrainingOutcome};
pub use cross_validation::{CVResults, CVSplit, CVStrategy, CrossValidator};
pub use linear_models::{LassoRegression, LinearRegression, RidgeRegression};
pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::RandomForest;
pub use knn::{KNNConfig, KNNRegressor, WeightScheme};
pub use xgboost::{XGBoostConfig, XGBoostRegressor};
pub use catboost::{CatBoostConfig, CatBoostRegressor};
pub use adaboost::AdaBoostRegressor;
