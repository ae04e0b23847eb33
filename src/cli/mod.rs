//! scorecast CLI module
//!
//! Command-line interface for training, prediction, and data inspection.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::PipelineConfig;
use crate::ingestion::{load_csv, write_csv};
use crate::inference::{PredictPipeline, StudentRecord};
use crate::pipeline::TrainPipeline;
use crate::training::TrainedModel;
use crate::export::Artifact;
use crate::preprocessing::DataPreprocessor;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "scorecast")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and serve student exam-score regressors")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run ingestion, transformation and model selection
    Train {
        /// Source CSV (overrides the config file)
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// JSON run configuration
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Directory for every artifact
        #[arg(long)]
        artifacts: Option<PathBuf>,

        /// Minimum test R² of the selected model
        #[arg(long)]
        threshold: Option<f64>,

        /// Number of cross-validation folds
        #[arg(long)]
        cv_folds: Option<usize>,

        /// Restrict training to these candidates (repeatable)
        #[arg(long = "model")]
        models: Vec<String>,

        /// Abort after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Predict the math score of one student, or of every row in a CSV
    Predict {
        /// Persisted model
        #[arg(long, default_value = "artifacts/model.bin")]
        model: PathBuf,

        /// Persisted preprocessor
        #[arg(long, default_value = "artifacts/preprocessor.bin")]
        preprocessor: PathBuf,

        /// Batch input CSV; single-record flags are ignored when set
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write batch predictions
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        race_ethnicity: Option<String>,
        #[arg(long)]
        parental_level_of_education: Option<String>,
        #[arg(long)]
        lunch: Option<String>,
        #[arg(long)]
        test_preparation_course: Option<String>,
        #[arg(long)]
        reading_score: Option<f64>,
        #[arg(long)]
        writing_score: Option<f64>,
    },

    /// Describe a dataset or persisted artifacts
    Info {
        /// CSV to describe
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Persisted model to describe
        #[arg(long)]
        model: Option<PathBuf>,

        /// Persisted preprocessor to describe
        #[arg(long)]
        preprocessor: Option<PathBuf>,
    },
}

// ─── Train ─────────────────────────────────────────────────────────────────────

pub struct TrainArgs {
    pub data: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub artifacts: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub cv_folds: Option<usize>,
    pub models: Vec<String>,
    pub timeout: Option<u64>,
}

impl TrainArgs {
    /// Config file first, then flags on top
    pub fn resolve(&self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(dir) = &self.artifacts {
            config = config.with_artifacts_dir(dir);
        }
        if let Some(data) = &self.data {
            config.ingestion.source_path = data.clone();
        }
        if let Some(threshold) = self.threshold {
            config.trainer.quality_threshold = threshold;
        }
        if let Some(folds) = self.cv_folds {
            config.trainer.cv_folds = folds;
        }
        if !self.models.is_empty() {
            config.trainer.candidates = Some(self.models.clone());
        }
        if let Some(secs) = self.timeout {
            config.trainer.timeout_secs = Some(secs);
        }
        Ok(config)
    }
}

pub fn cmd_train(args: &TrainArgs) -> anyhow::Result<()> {
    section("Train");
    let config = args.resolve()?;

    step_run(&format!("Training on {}", config.ingestion.source_path.display()));
    let start = Instant::now();
    let outcome = TrainPipeline::new(config).run()?;
    step_done(&format!("{:?}", start.elapsed()));

    let training = &outcome.training;
    println!();
    println!("  {:<28} {:>10} {:>10}", muted("Model"), muted("CV R²"), muted("Test R²"));
    println!("  {}", dim(&"─".repeat(50)));
    for summary in &training.candidates {
        let test = training
            .report
            .get(&summary.name)
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<28} {:>10.4} {:>10}", summary.name, summary.cv_score, test);
    }
    for (name, reason) in &training.skipped {
        println!("  {:<28} {}", name, format!("skipped: {}", reason).red());
    }
    println!("  {}", dim(&"─".repeat(50)));

    println!();
    println!("  {} {} {}", ok("✓"), "Best model".white(), training.best_model_name.cyan().bold());
    println!("  {:<16} {}", muted("Params"), training.best_params.to_string().white());
    println!("  {:<16} {}", muted("R²"), format!("{:.4}", training.metrics.r2).white().bold());
    println!("  {:<16} {}", muted("RMSE"), format!("{:.4}", training.metrics.rmse).white());
    println!("  {:<16} {}", muted("MAE"), format!("{:.4}", training.metrics.mae).white());
    println!("  {:<16} {}", muted("Model"), training.model_path.display());
    println!("  {:<16} {}", muted("Preprocessor"), outcome.preprocessor_path.display());
    println!();

    Ok(())
}

// ─── Predict ───────────────────────────────────────────────────────────────────

pub fn cmd_predict(
    model: &Path,
    preprocessor: &Path,
    input: Option<&Path>,
    output: Option<&Path>,
    record: &StudentRecord,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading artifacts");
    let pipeline = PredictPipeline::load(model, preprocessor)?;
    step_done(&pipeline.model().kind().to_string());

    match input {
        Some(input) => {
            let mut df = load_csv(input)?;
            step_run(&format!("Predicting {} rows", df.height()));
            let predictions = pipeline.predict(&df)?;
            step_done("");

            let column = Series::new("prediction".into(), predictions.to_vec());
            df.with_column(column)?;
            match output {
                Some(path) => {
                    write_csv(&mut df, path)?;
                    println!("  {} wrote {}", ok("✓"), path.display());
                }
                None => println!("{}", df),
            }
        }
        None => {
            let prediction = pipeline.predict_record(record)?;
            println!();
            println!(
                "  {:<16} {}",
                muted("Math score"),
                format!("{:.2}", prediction).white().bold()
            );
        }
    }
    println!();
    Ok(())
}

// ─── Info ──────────────────────────────────────────────────────────────────────

pub fn cmd_info(
    data: Option<&Path>,
    model: Option<&Path>,
    preprocessor: Option<&Path>,
) -> anyhow::Result<()> {
    if data.is_none() && model.is_none() && preprocessor.is_none() {
        anyhow::bail!("nothing to describe: pass --data, --model or --preprocessor");
    }

    if let Some(path) = data {
        section("Data Info");
        let df = load_csv(path)?;

        println!("  {:<12} {}", muted("File"), path.display());
        println!("  {:<12} {}", muted("Rows"), df.height());
        println!("  {:<12} {}", muted("Columns"), df.width());
        println!();

        println!("  {:<28} {:<12} {:>6} {:>8}", muted("Column"), muted("Type"), muted("Nulls"), muted("Unique"));
        println!("  {}", dim(&"─".repeat(58)));
        for col in df.get_columns() {
            println!(
                "  {:<28} {:<12} {:>6} {:>8}",
                col.name(),
                format!("{:?}", col.dtype()).truecolor(140, 140, 140),
                col.null_count(),
                col.n_unique().unwrap_or(0)
            );
        }
        println!();
    }

    if let Some(path) = model {
        section("Model");
        let model = TrainedModel::load(path)?;
        println!("  {:<12} {}", muted("File"), path.display());
        println!("  {:<12} {}", muted("Kind"), model.kind().to_string().cyan());
        println!();
    }

    if let Some(path) = preprocessor {
        section("Preprocessor");
        let pre = DataPreprocessor::load(path)?;
        println!("  {:<12} {}", muted("File"), path.display());
        println!("  {:<12} {}", muted("Target"), pre.config().target_column);
        println!("  {:<12} {}", muted("Features"), pre.feature_names().len());
        for name in pre.feature_names() {
            println!("    {}", dim(name));
        }
        println!();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_train_flags() {
        let cli = Cli::try_parse_from([
            "scorecast", "train", "--data", "students.csv", "--threshold", "0.5",
            "--model", "Ridge", "--model", "Lasso",
        ])
        .unwrap();
        match cli.command {
            Commands::Train { data, threshold, models, .. } => {
                assert_eq!(data, Some(PathBuf::from("students.csv")));
                assert_eq!(threshold, Some(0.5));
                assert_eq!(models, vec!["Ridge", "Lasso"]);
            }
            _ => panic!("expected train"),
        }
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = TrainArgs {
            data: Some(PathBuf::from("x.csv")),
            config: None,
            artifacts: Some(PathBuf::from("out")),
            threshold: None,
            cv_folds: Some(5),
            models: vec![],
            timeout: None,
        };
        let config = args.resolve().unwrap();
        assert_eq!(config.ingestion.source_path, PathBuf::from("x.csv"));
        assert_eq!(config.trainer.cv_folds, 5);
        assert_eq!(config.trainer.quality_threshold, 0.6);
        assert_eq!(config.trainer.trained_model_file_path, PathBuf::from("out").join("model.bin"));
    }

    #[test]
    fn test_predict_defaults() {
        let cli = Cli::try_parse_from(["scorecast", "predict", "--lunch", "standard"]).unwrap();
        match cli.command {
            Commands::Predict { model, lunch, gender, .. } => {
                assert_eq!(model, PathBuf::from("artifacts/model.bin"));
                assert_eq!(lunch.as_deref(), Some("standard"));
                assert!(gender.is_none());
            }
            _ => panic!("expected predict"),
        }
    }
}
