use serde_json::json;

use crate::cli::{open_postgres, OutputFormat};
use crate::config::AppConfig;

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = open_postgres(config).await?;
    store.migrate().await?;
    store.close().await;

    match output_format {
        OutputFormat::Json => println!("{}", json!({ "success": true, "message": "Schema is up to date" })),
        OutputFormat::Text => println!("✓ Schema is up to date"),
    }
    Ok(())
}
