//! Hyperparameter search
//!
//! Grids are expanded in a fixed order and every grid point is scored with
//! k-fold cross-validated R² on the training set only.

mod grid_search;
mod search_space;

pub use grid_search::{ComboResult, GridSearchCV, SearchResult};
pub use search_space::{ParamGrid, ParamSet, ParamValue};
