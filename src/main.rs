//! scorecast - Main Entry Point

use clap::Parser;
use scorecast::cli::{cmd_info, cmd_predict, cmd_train, Cli, Commands, TrainArgs};
use scorecast::inference::StudentRecord;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train { data, config, artifacts, threshold, cv_folds, models, timeout } => {
            cmd_train(&TrainArgs { data, config, artifacts, threshold, cv_folds, models, timeout })?;
        }
        Commands::Predict {
            model,
            preprocessor,
            input,
            output,
            gender,
            race_ethnicity,
            parental_level_of_education,
            lunch,
            test_preparation_course,
            reading_score,
            writing_score,
        } => {
            let record = StudentRecord {
                gender,
                race_ethnicity,
                parental_level_of_education,
                lunch,
                test_preparation_course,
                reading_score,
                writing_score,
            };
            cmd_predict(&model, &preprocessor, input.as_deref(), output.as_deref(), &record)?;
        }
        Commands::Info { data, model, preprocessor } => {
            cmd_info(data.as_deref(), model.as_deref(), preprocessor.as_deref())?;
        }
    }

    Ok(())
}
