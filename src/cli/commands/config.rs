use crate::cli::OutputFormat;
use crate::config::AppConfig;

pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => {
            println!("Environment:     {:?}", config.environment);
            println!("Port:            {}", config.server.port);
            println!("Identity URL:    {}", config.identity.base_url);
            println!("Identity timeout {} ms", config.identity.timeout_ms);
            println!("Store backend:   {:?}", config.store.backend);
            println!("Store creds:     {:?}", config.store.credentials);
            println!("Invite retries:  {}", config.trips.invite_max_retries);
            println!("CORS origins:    {}", config.security.cors_origins.join(", "));
        }
    }
    Ok(())
}
