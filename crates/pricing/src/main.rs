//! Used-vehicle price estimation CLI

use anyhow::{Context, Result};
use autoprice::{PipelineConfig, PricingPipeline};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "autoprice")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic random-forest price estimates for vehicle listings", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train on the labelled table and price every evaluation row
    Predict(PathArgs),
    /// Compare the forest against a single tree on a holdout of the training rows
    Evaluate(PathArgs),
    /// Print the effective configuration as TOML
    ShowConfig,
}

#[derive(clap::Args, Debug, Default)]
struct PathArgs {
    /// Labelled training table
    #[arg(long)]
    train: Option<PathBuf>,

    /// Evaluation table to price
    #[arg(long)]
    eval: Option<PathBuf>,

    /// Result file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl PathArgs {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(train) = self.train {
            config.paths.train = train;
        }
        if let Some(eval) = self.eval {
            config.paths.eval = eval;
        }
        if let Some(output) = self.output {
            config.paths.output = output;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(cli.verbose)));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    match cli.command.unwrap_or(Command::Predict(PathArgs::default())) {
        Command::Predict(paths) => {
            paths.apply(&mut config);
            predict(config)
        }
        Command::Evaluate(paths) => {
            paths.apply(&mut config);
            evaluate(config)
        }
        Command::ShowConfig => {
            config.validate().context("Invalid configuration")?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// Log directive used when `RUST_LOG` is unset.
fn default_directive(verbose: bool) -> String {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    level.to_string().to_lowercase()
}

fn predict(config: PipelineConfig) -> Result<()> {
    info!("autoprice v{}", env!("CARGO_PKG_VERSION"));
    let pipeline = PricingPipeline::new(config).context("Invalid configuration")?;
    let summary = pipeline.run().context("Pricing run failed")?;

    info!(
        "Priced {} listings using {} training rows",
        summary.evaluation_rows, summary.training_rows
    );
    for (column, count) in &summary.cardinalities {
        info!("  {column}: {count} categories");
    }
    info!("Output: {}", summary.output_path.display());
    info!("BLAKE3: {}", summary.output_digest);

    Ok(())
}

fn evaluate(config: PipelineConfig) -> Result<()> {
    let pipeline = PricingPipeline::new(config).context("Invalid configuration")?;
    let summary = pipeline.evaluate().context("Holdout evaluation failed")?;

    info!(
        "Scored on {} holdout rows ({} fit rows)",
        summary.holdout_rows, summary.fit_rows
    );
    info!("Metrics: {}", summary.metrics_path.display());
    info!("Predictions: {}", summary.predictions_path.display());

    Ok(())
}
