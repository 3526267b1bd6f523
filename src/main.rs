// Entry point for the credit-card fraud classifier. `train` fits and persists the model,
// `stats` describes a labeled dataset and `score` opens the interactive scorer.
use std::io;
use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use config::AppConfig;
use console::Console;
use scorer::Scorer;

mod artifact;
mod chart;
mod config;
mod console;
mod csv_reader;
mod error;
mod forest;
mod input_field;
mod metrics;
mod scorer;
mod stats;
mod trainer;

#[derive(Parser)]
#[command(name = "fraudscan")]
#[command(about = "Credit-card fraud classifier: training pipeline and interactive scorer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the classifier and write the model artifact and metrics report
    Train(TrainArgs),
    /// Print class balance and Amount statistics for a labeled dataset
    Stats {
        /// Labeled CSV dataset (overrides paths.dataset)
        #[arg(long)]
        data: Option<PathBuf>,
    },
    /// Load the model artifact and start an interactive scoring session
    Score,
}

#[derive(Args)]
struct TrainArgs {
    /// Labeled CSV dataset (overrides paths.dataset)
    #[arg(long)]
    data: Option<PathBuf>,
    /// Random seed for the split and the forest (overrides training.seed)
    #[arg(long)]
    seed: Option<u64>,
}

impl TrainArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(data) = &self.data {
            config.paths.dataset = data.clone();
        }
        if let Some(seed) = self.seed {
            config.training.seed = seed;
        }
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}

// Runs the training pipeline and prints the evaluation to stdout
fn train(config: &AppConfig) -> Result<()> {
    let outcome = trainer::run(config)
        .with_context(|| format!("training on {} failed", config.paths.dataset.display()))?;

    info!(
        trees = outcome.model.forest.trees.len(),
        features = outcome.model.n_features(),
        train_rows = outcome.train_rows,
        test_rows = outcome.test_rows,
        model = %config.paths.model.display(),
        metrics = %config.paths.metrics.display(),
        "training complete"
    );

    println!("Evaluation Metrics:");
    for line in outcome.evaluation.metrics.report_lines() {
        println!("{}", line);
    }
    println!("Confusion Matrix (rows: true, columns: predicted; [legitimate, fraud]):");
    println!("{}", outcome.evaluation.confusion);
    Ok(())
}

fn stats(config: &AppConfig) -> Result<()> {
    let table = trainer::load(&config.paths.dataset)?;
    let summary = stats::dataset_stats(&table)?;
    println!("{}", summary);
    Ok(())
}

// Without a model the scorer does not start
fn score(config: &AppConfig) -> Result<()> {
    let scorer = match Scorer::open(&config.paths.model) {
        Ok(scorer) => scorer,
        Err(e) => {
            error!(error = %e, "model load failed, scorer disabled");
            return Err(e).context("Model load failed");
        }
    };

    let mut console = Console::new(scorer, config.paths.export.clone());
    console.run().context("terminal session failed")?;
    info!(
        flagged = console.scorer().fraud_set().map_or(0, |t| t.len()),
        "scoring session closed"
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    match &cli.command {
        Commands::Train(args) => {
            args.apply(&mut config);
            train(&config)
        }
        Commands::Stats { data } => {
            if let Some(data) = data {
                config.paths.dataset = data.clone();
            }
            stats(&config)
        }
        Commands::Score => score(&config),
    }
}
