use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

mod artifact;
mod config;
mod constants;
mod error;
mod frame;
mod ingestion;
mod logging;
mod schema;
mod source;
mod stats;
mod validation;

use crate::config::{IngestionConfig, PipelineRunConfig, ValidationConfig};
use crate::ingestion::DataIngestion;
use crate::source::SourceStore;
use crate::validation::DataValidation;

#[derive(Parser)]
#[command(name = "netsec_pipeline")]
#[command(about = "Ingestion and validation pipeline for phishing-detection training data")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ingestion and validation sequentially for one pipeline run
    Run {
        /// Base directory for run artifacts (default: current directory)
        #[arg(long)]
        artifacts_dir: Option<PathBuf>,
        /// Path to the source database (default: NETSEC_DATABASE_PATH or netsec.db)
        #[arg(long)]
        database: Option<PathBuf>,
        /// Test fraction for the train/test split
        #[arg(long)]
        split_ratio: Option<f64>,
    },
}

fn database_path(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var(constants::DATABASE_PATH_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(constants::DEFAULT_DATABASE_PATH))
}

fn run_pipeline(
    artifacts_dir: Option<PathBuf>,
    database: Option<PathBuf>,
    split_ratio: Option<f64>,
) -> error::Result<()> {
    let base_dir = artifacts_dir.unwrap_or_else(|| PathBuf::from("."));
    let run_config = PipelineRunConfig::new(&base_dir);
    info!("Artifact directory: {}", run_config.artifact_dir.display());

    let mut ingestion_config = IngestionConfig::new(&run_config);
    if let Some(ratio) = split_ratio {
        ingestion_config = ingestion_config.with_split_ratio(ratio)?;
    }
    ingestion_config.provision()?;

    let store = SourceStore::open(database_path(database))?;

    info!("Initiating data ingestion");
    let ingestion = DataIngestion::new(ingestion_config, store);
    let ingestion_artifact = ingestion.run()?;
    info!("Data ingestion completed");
    println!("\n📊 Ingestion artifact:");
    println!("   Train file: {}", ingestion_artifact.trained_file_path.display());
    println!("   Test file:  {}", ingestion_artifact.test_file_path.display());

    let validation_config = ValidationConfig::new(&run_config);
    validation_config.provision()?;

    info!("Initiating data validation");
    let validation = DataValidation::new(ingestion_artifact, validation_config)?;
    let validation_artifact = validation.run()?;
    info!("Data validation completed");
    println!("\n📊 Validation artifact:");
    println!("   Drift-free:   {}", validation_artifact.validation_status);
    println!(
        "   Valid train:  {}",
        validation_artifact.valid_train_file_path.display()
    );
    println!(
        "   Valid test:   {}",
        validation_artifact.valid_test_file_path.display()
    );
    println!(
        "   Drift report: {}",
        validation_artifact.drift_report_file_path.display()
    );

    Ok(())
}

fn main() {
    dotenv::dotenv().ok();
    // The guard must live for the whole run so file logs flush on exit.
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            artifacts_dir,
            database,
            split_ratio,
        } => {
            println!("🚀 Running ingestion + validation pipeline...");
            if let Err(e) = run_pipeline(artifacts_dir, database, split_ratio) {
                error!("Pipeline run failed: {e}");
                eprintln!("❌ Pipeline run failed: {e}");
                std::process::exit(1);
            }
            println!("\n✅ Pipeline run completed");
        }
    }
}
