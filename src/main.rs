//! hos-trip-planner - HOS-aware long-haul trip planner CLI
//!
//! Reads a TripInput JSON document, plans or validates it, and prints the
//! result as JSON.

mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use hos_planner::{DeterministicMapProvider, HttpMapProvider, HttpMapProviderConfig, MapProvider, TripInput};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = config::Config::from_env()?;

    match cli.command {
        Some(cli::Command::Validate { input }) => run_validate(input).await,
        Some(cli::Command::Plan { input }) | None => run_plan(config, input).await,
    }
}

fn init_tracing() {
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "./logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "hos-trip-planner.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    // Leak the guard: the process is short-lived and needs the writer alive
    // until exit, not until some owner drops it.
    Box::leak(Box::new(_guard));

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hos_planner=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
}

fn read_trip_input(input: Option<String>) -> Result<TripInput> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(&path).with_context(|| format!("failed to read {path}"))?,
        None => std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?,
    };
    serde_json::from_str(&raw).context("failed to parse TripInput JSON")
}

async fn run_validate(input: Option<String>) -> Result<()> {
    let trip = read_trip_input(input)?;
    match hos_planner::validate(&trip) {
        Ok(()) => {
            println!("{}", serde_json::json!({ "valid": true }));
            Ok(())
        }
        Err(e) => {
            println!("{}", serde_json::json!({ "valid": false, "error": e.to_string() }));
            Ok(())
        }
    }
}

async fn run_plan(config: config::Config, input: Option<String>) -> Result<()> {
    let trip = read_trip_input(input)?;

    info!(mock = config.use_mock_map_provider, "planning trip");

    let result = if config.use_mock_map_provider {
        let provider = DeterministicMapProvider::new();
        plan_with(&trip, &provider).await?
    } else {
        let provider = HttpMapProvider::new(HttpMapProviderConfig {
            geocoder_base_url: config.geocoder_url.clone(),
            directions_base_url: config.directions_url.clone(),
            timeout_seconds: config.map_provider_timeout_seconds,
        });
        plan_with(&trip, &provider).await?
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn plan_with(trip: &TripInput, provider: &dyn MapProvider) -> Result<hos_planner::PlanResult> {
    hos_planner::plan(trip, provider).await.map_err(Into::into)
}
