use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

use crate::app::{self, AppState};
use crate::cli::open_store;
use crate::config::AppConfig;
use crate::identity::HttpIdentityGateway;

pub async fn handle(port: Option<u16>, config: &AppConfig) -> anyhow::Result<()> {
    let (store, postgres) = open_store(config).await?;

    let identity = HttpIdentityGateway::new(
        config.identity_url()?.as_str(),
        Duration::from_millis(config.identity.timeout_ms),
    )?;
    info!("Identity gateway: {}", config.identity.base_url);

    let state = AppState::new(store, Arc::new(identity), config.trips.invite_max_retries);
    let app = app::router(state, &config.security);

    let bind_addr = format!("0.0.0.0:{}", port.unwrap_or(config.server.port));
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Trip Planner API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(pg) = postgres {
        pg.close().await;
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
