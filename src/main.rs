use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use ecg::layout::TRAINING_DATA;
use ecg::{PredictError, PredictionPaths, ProjectLayout, TrainingConfig};
use ecg_forest::SplitCriterion;

#[derive(Parser)]
#[command(name = "ecg")]
#[command(about = "Train and apply a random forest classifier for ECG feature rows")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the train/test split and the forest
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all logging except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Fit encoder, scaler and forest on a labeled CSV and save the artifacts
    Train {
        /// Path to the labeled training CSV (relative to the working directory)
        #[arg(long, default_value = TRAINING_DATA)]
        data: PathBuf,

        /// Artifact directory (defaults to `models` under the project root)
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// Name of the label column
        #[arg(long, default_value = "Label")]
        label_column: String,

        /// Number of trees in the forest
        #[arg(long, default_value_t = 200)]
        n_trees: usize,

        /// Maximum tree depth (0 = unlimited)
        #[arg(long, default_value_t = 8)]
        max_depth: usize,

        /// Minimum samples a node needs before it may split
        #[arg(long, default_value_t = 3)]
        min_samples_split: usize,

        /// Split impurity measure: "gini" or "entropy"
        #[arg(long, default_value = "gini")]
        criterion: String,

        /// Grow every tree on the whole training partition instead of a bootstrap sample
        #[arg(long, default_value_t = false)]
        no_bootstrap: bool,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value_t = 0.2)]
        test_size: f64,

        /// Do not write evaluation.json next to the artifacts
        #[arg(long, default_value_t = false)]
        no_evaluation: bool,
    },

    /// Predict classes for a new CSV using the saved artifacts
    Predict {
        /// Artifact directory (defaults to `models` under the project root)
        #[arg(long)]
        models_dir: Option<PathBuf>,

        /// CSV to score (defaults to `data/new_ecg_data_matched.csv` under the project root)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output CSV (defaults to `data/prediction_results.csv` under the project root)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            if let Some(hint) = err.downcast_ref::<PredictError>().and_then(PredictError::hint) {
                eprintln!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn parse_criterion(s: &str) -> Result<SplitCriterion> {
    match s {
        "gini" => Ok(SplitCriterion::Gini),
        "entropy" => Ok(SplitCriterion::Entropy),
        other => anyhow::bail!("unknown criterion: {other} (expected gini or entropy)"),
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Command::Train {
            data,
            models_dir,
            label_column,
            n_trees,
            max_depth,
            min_samples_split,
            criterion,
            no_bootstrap,
            test_size,
            no_evaluation,
        } => {
            let criterion = parse_criterion(&criterion)?;
            let models_dir = match models_dir {
                Some(dir) => dir,
                None => ProjectLayout::from_executable(true)
                    .context("failed to locate the project root")?
                    .models_dir(),
            };
            let config = TrainingConfig::new(data, models_dir)
                .with_label_column(label_column)
                .with_n_trees(n_trees)
                .with_max_depth((max_depth > 0).then_some(max_depth))
                .with_min_samples_split(min_samples_split)
                .with_criterion(criterion)
                .with_bootstrap(!no_bootstrap)
                .with_test_size(test_size)
                .with_seed(cli.seed)
                .with_write_evaluation(!no_evaluation);

            ecg::run_training(&config, &mut stdout).context("training failed")?;
        }

        Command::Predict {
            models_dir,
            input,
            output,
        } => {
            let layout = ProjectLayout::from_executable(false)
                .context("failed to locate the project root")?;
            let defaults = PredictionPaths::from_layout(&layout);
            let paths = PredictionPaths {
                models_dir: models_dir.unwrap_or(defaults.models_dir),
                input: input.unwrap_or(defaults.input),
                output: output.unwrap_or(defaults.output),
            };

            // guarded failures keep their own message and hint
            ecg::run_prediction(&paths, &mut stdout)?;
        }
    }

    Ok(())
}
