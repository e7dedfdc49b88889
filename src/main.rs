use clap::Parser;
use tracing_subscriber::EnvFilter;

use trip_planner_api::{cli, config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up IDENTITY_SERVICE_URL, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Trip Planner API in {:?} mode", config.environment);

    cli::run(cli::Cli::parse(), config).await
}
