mod config;
mod error;
mod ml;
mod web;

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::ServiceConfig;
use crate::ml::{BootstrapOutcome, FileModelStore, Predictor};
use crate::web::{parse_features, start_server, AppState};

#[derive(Parser)]
#[command(name = "house-price-service")]
#[command(version)]
#[command(about = "Estimate house prices from a trained regression model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Model artifact location (overrides config and MODEL_PATH)
    #[arg(short, long)]
    model_path: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load (training first if needed) the model and serve HTTP requests
    Serve {
        /// Listening port (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Retrain the model from the training data and overwrite the artifact
    Train,
    /// Estimate a single price from the command line
    Predict {
        #[arg(long)]
        square_feet: f64,
        #[arg(long)]
        bedrooms: f64,
        #[arg(long)]
        bathrooms: f64,
        #[arg(long)]
        age_years: f64,
        #[arg(long)]
        garage_spaces: f64,
        #[arg(long)]
        location_score: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    init_logging(cli.verbose)?;

    let mut config = ServiceConfig::load(&cli.config)?;
    if let Some(path) = cli.model_path {
        config.model_path = path;
    }

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            check_config(&config)?;
            run_server(config).await?;
        }
        Commands::Train => {
            check_config(&config)?;
            train_model(&config)?;
        }
        Commands::Predict { square_feet, bedrooms, bathrooms, age_years, garage_spaces, location_score } => {
            check_config(&config)?;
            let payload = json!({
                "square_feet": square_feet,
                "bedrooms": bedrooms,
                "bathrooms": bathrooms,
                "age_years": age_years,
                "garage_spaces": garage_spaces,
                "location_score": location_score,
            });
            predict_once(config, payload).await?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn check_config(config: &ServiceConfig) -> Result<()> {
    config
        .validate()
        .map_err(|errors| anyhow!("Invalid configuration: {}", errors.join(", ")))
}

fn new_predictor(config: &ServiceConfig) -> Predictor {
    let store = FileModelStore::new(&config.model_path);
    Predictor::new(Box::new(store), config.training_source())
}

/// Runs the load/train sequence off the async workers. Failure is fatal.
async fn bootstrap(config: &ServiceConfig) -> Result<Predictor> {
    let mut predictor = new_predictor(config);

    let (predictor, outcome) = tokio::task::spawn_blocking(move || {
        predictor.bootstrap().map(|outcome| (predictor, outcome))
    })
    .await??;

    match outcome {
        BootstrapOutcome::Loaded => info!("Model ready (loaded from {})", config.model_path.display()),
        BootstrapOutcome::Trained(report) => info!(
            "Model ready (freshly trained on {} samples, R²={:.3})",
            report.samples, report.r_squared
        ),
    }

    Ok(predictor)
}

async fn run_server(config: ServiceConfig) -> Result<()> {
    info!("House Price Service v{}", env!("CARGO_PKG_VERSION"));

    let predictor = bootstrap(&config).await?;
    let state = AppState::new(predictor, config);
    start_server(state).await
}

fn train_model(config: &ServiceConfig) -> Result<()> {
    info!("Retraining price model into {}", config.model_path.display());

    let mut predictor = new_predictor(config);
    let report = predictor.train_and_save()?;
    if !predictor.load_model()? {
        return Err(anyhow!("Model not found at {} after training", config.model_path.display()));
    }

    println!("Trained on {} samples", report.samples);
    println!("  R²:   {:.4}", report.r_squared);
    println!("  RMSE: {:.2}", report.rmse);
    println!("Saved to {}", config.model_path.display());
    Ok(())
}

async fn predict_once(config: ServiceConfig, payload: serde_json::Value) -> Result<()> {
    let features = parse_features(&payload)?;
    let predictor = bootstrap(&config).await?;
    let price = predictor.predict(&features)?;

    println!("Estimated price: ${:.2}", price);
    Ok(())
}
