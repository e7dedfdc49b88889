pub mod commands;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{AppConfig, StoreBackend};
use crate::store::{DocumentStore, MemoryStore, PostgresStore};

#[derive(Parser)]
#[command(name = "trip-planner")]
#[command(about = "Trip Planner API - collaborative trips, events and tasks")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server (default)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides TRIP_API_PORT/PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Create or update the PostgreSQL document store schema")]
    Migrate,

    #[command(about = "Print the resolved configuration")]
    Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port, config).await,
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::Config => commands::config::handle(config, output_format),
    }
}

/// Open the configured document store. Postgres is migrated on open.
pub async fn open_store(config: &AppConfig) -> anyhow::Result<(Arc<dyn DocumentStore>, Option<PostgresStore>)> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Ok((Arc::new(MemoryStore::new()), None))
        }
        StoreBackend::Postgres => {
            let pg = open_postgres(config).await?;
            pg.migrate().await.context("failed to migrate document store")?;
            Ok((Arc::new(pg.clone()), Some(pg)))
        }
    }
}

pub async fn open_postgres(config: &AppConfig) -> anyhow::Result<PostgresStore> {
    let url = config.database_url()?;
    PostgresStore::connect(&url, config.store.max_connections)
        .await
        .context("failed to connect to document store")
}
