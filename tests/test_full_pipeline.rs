//! Integration test: Full pipeline (ingest → transform → select → persist → predict)

use polars::prelude::*;
use scorecast::config::PipelineConfig;
use scorecast::ingestion::{load_csv, write_csv};
use scorecast::inference::{PredictPipeline, StudentRecord};
use scorecast::pipeline::TrainPipeline;
use scorecast::training::{RecordingObserver, TrainingEvent};
use scorecast::ScorecastError;
use std::path::Path;
use std::sync::Arc;

/// `math score` is exactly the mean of the two other scores
fn linear_students(n: usize) -> DataFrame {
    let reading: Vec<i64> = (0..n as i64).map(|i| 50 + 3 * i).collect();
    let writing: Vec<i64> = (0..n as i64).map(|i| 40 + 2 * ((7 * i) % 11)).collect();
    let math: Vec<f64> = reading
        .iter()
        .zip(&writing)
        .map(|(r, w)| (*r as f64 + *w as f64) / 2.0)
        .collect();
    let gender: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "female" } else { "male" }).collect();

    df!(
        "gender" => gender,
        "race/ethnicity" => vec!["group B"; n],
        "parental level of education" => vec!["some college"; n],
        "lunch" => vec!["standard"; n],
        "test preparation course" => vec!["none"; n],
        "math score" => math,
        "reading score" => reading,
        "writing score" => writing
    )
    .unwrap()
}

fn write_source(dir: &Path, n: usize) -> std::path::PathBuf {
    let source = dir.join("StudentsPerformance.csv");
    write_csv(&mut linear_students(n), &source).unwrap();
    source
}

#[test]
fn test_linear_dataset_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), 10);
    let artifacts = dir.path().join("artifacts");

    let mut config = PipelineConfig::new().with_artifacts_dir(&artifacts);
    config.ingestion.source_path = source;
    config.trainer.candidates = Some(vec!["Linear Regression".to_string()]);

    let observer = Arc::new(RecordingObserver::new());
    let outcome = TrainPipeline::new(config)
        .with_observer(observer.clone())
        .run()
        .unwrap();

    assert_eq!(load_csv(&outcome.test_path).unwrap().height(), 2);
    assert_eq!(load_csv(&outcome.train_path).unwrap().height(), 8);
    assert!(artifacts.join("data.csv").exists());

    let training = &outcome.training;
    assert_eq!(training.best_model_name, "Linear Regression");
    assert!(training.best_params.is_empty());
    assert!(training.test_r2 >= 0.99, "test R² was {}", training.test_r2);
    assert!(training.metrics.rmse < 1e-3);
    assert!(training.skipped.is_empty());

    let events = observer.events();
    assert!(events.iter().any(|e| matches!(e, TrainingEvent::ModelSaved { .. })));
}

#[test]
fn test_persisted_artifacts_predict() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), 30);
    let artifacts = dir.path().join("artifacts");

    let mut config = PipelineConfig::new().with_artifacts_dir(&artifacts);
    config.ingestion.source_path = source;
    config.trainer.candidates = Some(vec!["Linear Regression".to_string(), "Ridge".to_string()]);
    let outcome = TrainPipeline::new(config).run().unwrap();

    let predictor = PredictPipeline::load(
        &outcome.training.model_path,
        &outcome.preprocessor_path,
    )
    .unwrap();

    let record = StudentRecord {
        gender: Some("female".to_string()),
        race_ethnicity: Some("group B".to_string()),
        parental_level_of_education: Some("some college".to_string()),
        lunch: Some("standard".to_string()),
        test_preparation_course: Some("none".to_string()),
        reading_score: Some(70.0),
        writing_score: Some(60.0),
    };
    let predicted = predictor.predict_record(&record).unwrap();
    if outcome.training.best_model_name == "Linear Regression" {
        assert!((predicted - 65.0).abs() < 1e-3, "predicted {}", predicted);
    } else {
        assert!((predicted - 65.0).abs() < 5.0, "predicted {}", predicted);
    }

    // batch prediction over the held-out split matches the in-memory model
    let test_df = load_csv(&outcome.test_path).unwrap();
    let batch = predictor.predict(&test_df).unwrap();
    assert_eq!(batch.len(), test_df.height());
}

#[test]
fn test_unreachable_threshold_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path(), 20);
    let artifacts = dir.path().join("artifacts");

    let mut config = PipelineConfig::new().with_artifacts_dir(&artifacts);
    config.ingestion.source_path = source;
    config.trainer.candidates = Some(vec!["Linear Regression".to_string()]);
    config.trainer.quality_threshold = 1.5;

    let err = TrainPipeline::new(config).run().unwrap_err();
    assert!(matches!(err, ScorecastError::BelowThreshold { .. }));
    assert!(!artifacts.join("model.bin").exists());
    // earlier stages still produced their artifacts
    assert!(artifacts.join("preprocessor.bin").exists());
}

#[test]
fn test_missing_source_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = PipelineConfig::new().with_artifacts_dir(dir.path());
    config.ingestion.source_path = dir.path().join("absent.csv");
    let err = TrainPipeline::new(config).run().unwrap_err();
    assert!(matches!(err, ScorecastError::Io { .. }));
}
