//! CLI command definitions for phishguard.
//!
//! `train` runs the full pipeline against the document store, `predict` and
//! `predict-csv` serve the last pushed model, and `seed` loads a raw CSV
//! export into the store.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use crate::config::PipelineConfig;
use crate::pipeline::TrainingPipeline;
use crate::serving::PredictionService;
use crate::store::{documents_from_csv, Document, DocumentStore, JsonlStore};

/// Default root of the JSONL document store.
const DEFAULT_STORE_ROOT: &str = "./store";

/// Phishing-website classifier pipeline.
#[derive(Parser)]
#[command(name = "phishguard")]
#[command(about = "Train and serve a phishing-website classifier")]
#[command(version)]
#[command(
    long_about = "phishguard runs an artifact-based training pipeline (ingest, validate, \
transform, train, evaluate, push) and serves predictions from the last accepted model.\n\n\
Example usage:\n  phishguard seed --input data/phishing.csv\n  phishguard train --seed 42\n  \
phishguard predict --input request.json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the full training pipeline.
    Train(TrainArgs),

    /// Predict a single JSON record of the 30 named features.
    Predict(PredictArgs),

    /// Predict every row of a CSV file and write a copy with a
    /// `prediction` column.
    #[command(name = "predict-csv")]
    PredictCsv(PredictCsvArgs),

    /// Load a raw CSV export into the document store.
    Seed(SeedArgs),
}

/// Arguments for `phishguard train`.
#[derive(Parser, Debug)]
pub struct TrainArgs {
    /// Root directory of the JSONL document store.
    #[arg(long, default_value = DEFAULT_STORE_ROOT, env = "PHISHGUARD_STORE_ROOT")]
    pub store_root: PathBuf,

    /// Root directory for per-run artifacts.
    #[arg(long, default_value = "artifacts")]
    pub artifact_root: PathBuf,

    /// Root directory of the serving location and archive.
    #[arg(long, default_value = "saved_models")]
    pub serving_root: PathBuf,

    /// Document-store database to ingest from.
    #[arg(long, default_value = "phishing")]
    pub database: String,

    /// Document-store collection to ingest from.
    #[arg(long, default_value = "websites")]
    pub collection: String,

    /// Fraction of rows assigned to the test split.
    #[arg(long, default_value = "0.2")]
    pub split_ratio: f64,

    /// Train-f1 floor below which training aborts as underfit.
    #[arg(long, default_value = "0.6")]
    pub expected_accuracy: f64,

    /// Maximum allowed train/test f1 gap before aborting as overfit.
    #[arg(long, default_value = "0.05")]
    pub overfit_threshold: f64,

    /// Evaluation-f1 floor for accepting the model (0 accepts everything).
    #[arg(long, default_value = "0.0")]
    pub acceptance_threshold: f64,

    /// KS significance level for the drift report.
    #[arg(long, default_value = "0.05")]
    pub drift_significance: f64,

    /// Seed for a reproducible train/test split.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for `phishguard predict`.
#[derive(Parser, Debug)]
pub struct PredictArgs {
    /// JSON file holding one object of the 30 named integer features.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Root directory of the serving location and archive.
    #[arg(long, default_value = "saved_models")]
    pub serving_root: PathBuf,
}

/// Arguments for `phishguard predict-csv`.
#[derive(Parser, Debug)]
pub struct PredictCsvArgs {
    /// Input CSV of feature rows.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output CSV with the appended `prediction` column.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Root directory of the serving location and archive.
    #[arg(long, default_value = "saved_models")]
    pub serving_root: PathBuf,
}

/// Arguments for `phishguard seed`.
#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// CSV file to load into the store.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Root directory of the JSONL document store.
    #[arg(long, default_value = DEFAULT_STORE_ROOT, env = "PHISHGUARD_STORE_ROOT")]
    pub store_root: PathBuf,

    /// Target database.
    #[arg(long, default_value = "phishing")]
    pub database: String,

    /// Target collection.
    #[arg(long, default_value = "websites")]
    pub collection: String,
}

/// Parses CLI arguments from the process environment.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Dispatches a parsed CLI invocation.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Train(args) => run_train(args),
        Commands::Predict(args) => run_predict(args),
        Commands::PredictCsv(args) => run_predict_csv(args),
        Commands::Seed(args) => run_seed(args),
    }
}

fn run_train(args: TrainArgs) -> anyhow::Result<()> {
    let config = PipelineConfig {
        artifact_root: args.artifact_root,
        serving_root: args.serving_root,
        database: args.database,
        collection: args.collection,
        split_ratio: args.split_ratio,
        drift_significance: args.drift_significance,
        expected_accuracy: args.expected_accuracy,
        overfit_threshold: args.overfit_threshold,
        acceptance_threshold: args.acceptance_threshold,
        seed: args.seed,
    };
    let store = JsonlStore::new(args.store_root);

    let pipeline = TrainingPipeline::new(config, store);
    let report = pipeline.run().context("training pipeline failed")?;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to encode run report")?
    );
    Ok(())
}

fn run_predict(args: PredictArgs) -> anyhow::Result<()> {
    let raw = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let record: Document =
        serde_json::from_str(&raw).context("input is not a JSON object of features")?;

    let service = PredictionService::new(args.serving_root);
    let prediction = service.predict_record(&record)?;
    let result = if prediction == 1 { "phishing" } else { "legitimate" };

    println!(
        "{}",
        serde_json::json!({ "prediction": prediction, "result": result })
    );
    Ok(())
}

fn run_predict_csv(args: PredictCsvArgs) -> anyhow::Result<()> {
    let service = PredictionService::new(args.serving_root);
    let summary = service
        .predict_csv(&args.input, &args.output)
        .context("batch prediction failed")?;

    info!(output = %args.output.display(), "wrote predictions");
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn run_seed(args: SeedArgs) -> anyhow::Result<()> {
    let documents = documents_from_csv(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;
    let store = JsonlStore::new(args.store_root);
    let written = store.insert_many(&args.database, &args.collection, &documents)?;

    println!(
        "inserted {written} records into {}/{}",
        args.database, args.collection
    );
    Ok(())
}
