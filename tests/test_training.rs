//! Integration test: model selection over the registry

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use scorecast::optimizer::{GridSearchCV, ParamGrid, ParamSet};
use scorecast::training::{
    default_registry, select_candidates, ModelCandidate, ModelKind, ModelTrainer, Regressor,
    TrainerConfig,
};
use scorecast::ScorecastError;

/// Noisy linear target in the last column
fn combined(n: usize, seed: u64) -> Array2<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut arr = Array2::zeros((n, 4));
    for mut row in arr.rows_mut() {
        let a: f64 = rng.gen_range(-2.0..2.0);
        let b: f64 = rng.gen_range(-2.0..2.0);
        let c: f64 = rng.gen_range(-2.0..2.0);
        let noise: f64 = rng.gen_range(-0.1..0.1);
        row[0] = a;
        row[1] = b;
        row[2] = c;
        row[3] = 3.0 * a - b + 0.5 * c + 10.0 + noise;
    }
    arr
}

fn split(arr: &Array2<f64>) -> (Array2<f64>, Array1<f64>) {
    let n = arr.ncols();
    (
        arr.slice(ndarray::s![.., ..n - 1]).to_owned(),
        arr.column(n - 1).to_owned(),
    )
}

#[test]
fn test_grid_search_is_deterministic() {
    let (x, y) = split(&combined(60, 1));
    let candidate = ModelCandidate::new(
        "Random Forest Regressor",
        ModelKind::RandomForest,
        ParamGrid::new()
            .param("n_estimators", [5i64, 10])
            .param("max_depth", [Some(3i64), None]),
    );
    let a = GridSearchCV::new(&candidate).fit(&x, &y).unwrap();
    let b = GridSearchCV::new(&candidate).fit(&x, &y).unwrap();
    assert_eq!(a.best_params, b.best_params);
    assert_eq!(a.best_score, b.best_score);
    assert_eq!(a.cv_results.len(), 4);
    assert_eq!(
        a.best_estimator.predict(&x).unwrap(),
        b.best_estimator.predict(&x).unwrap()
    );
}

#[test]
fn test_single_point_grid_returns_it() {
    let (x, y) = split(&combined(30, 2));
    let candidate = ModelCandidate::new(
        "Lasso",
        ModelKind::Lasso,
        ParamGrid::new().param("alpha", [0.1]),
    );
    let result = GridSearchCV::new(&candidate).fit(&x, &y).unwrap();
    assert_eq!(result.best_params, ParamSet::new().with("alpha", 0.1));
}

#[test]
fn test_every_registry_family_trains() {
    let (x, y) = split(&combined(45, 3));
    for candidate in default_registry() {
        let params = candidate.grid.combinations().remove(0);
        let mut model = candidate.kind.build(&params, 7).unwrap();
        model
            .fit(&x, &y)
            .unwrap_or_else(|e| panic!("{} failed to fit: {}", candidate.name, e));
        let pred = model.predict(&x).unwrap();
        assert_eq!(pred.len(), x.nrows());
        assert!(pred.iter().all(|p| p.is_finite()), "{}", candidate.name);
    }
}

#[test]
fn test_linear_family_wins_on_linear_data() {
    let dir = tempfile::tempdir().unwrap();
    let names: Vec<String> = ["Linear Regression", "Ridge", "K-Neighbors Regressor", "Decision Tree"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let registry = select_candidates(default_registry(), &names).unwrap();
    let trainer = ModelTrainer::new(
        TrainerConfig::new().with_model_path(dir.path().join("model.bin")),
    )
    .with_registry(registry);

    let outcome = trainer
        .initiate_model_trainer(&combined(80, 4), &combined(20, 5))
        .unwrap();
    assert!(
        outcome.best_model_name == "Linear Regression" || outcome.best_model_name == "Ridge",
        "unexpected winner {}",
        outcome.best_model_name
    );
    assert!(outcome.test_r2 > 0.95);
    assert_eq!(outcome.report.len(), 4);
    assert_eq!(outcome.candidates.len(), 4);
}

#[test]
fn test_threshold_boundary_via_trainer() {
    let dir = tempfile::tempdir().unwrap();
    let registry = vec![ModelCandidate::new(
        "Linear Regression",
        ModelKind::LinearRegression,
        ParamGrid::new(),
    )];
    let train = combined(40, 6);
    let test = combined(15, 7);

    // learn the exact score first, then gate exactly on it
    let probe = ModelTrainer::new(
        TrainerConfig::new()
            .with_model_path(dir.path().join("probe.bin"))
            .with_quality_threshold(f64::NEG_INFINITY),
    )
    .with_registry(registry.clone())
    .initiate_model_trainer(&train, &test)
    .unwrap();

    let exact = ModelTrainer::new(
        TrainerConfig::new()
            .with_model_path(dir.path().join("exact.bin"))
            .with_quality_threshold(probe.test_r2),
    )
    .with_registry(registry.clone())
    .initiate_model_trainer(&train, &test);
    assert!(exact.is_ok());

    let above = ModelTrainer::new(
        TrainerConfig::new()
            .with_model_path(dir.path().join("above.bin"))
            .with_quality_threshold(probe.test_r2 + 1e-9),
    )
    .with_registry(registry)
    .initiate_model_trainer(&train, &test);
    assert!(matches!(above, Err(ScorecastError::BelowThreshold { .. })));
}
