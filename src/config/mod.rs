use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub identity: IdentityConfig,
    pub store: StoreConfig,
    pub trips: TripConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

/// Where the Postgres connection URL comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreCredentials {
    /// Explicit credential file holding the connection URL (non-production only)
    File(PathBuf),
    /// `DATABASE_URL` from the managed environment
    Ambient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub credentials: StoreCredentials,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripConfig {
    pub invite_max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid URL in {name}: {reason}")]
    InvalidUrl { name: &'static str, reason: String },

    #[error("Failed to read credential file {}: {source}", path.display())]
    CredentialFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("TRIP_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }

        // Identity overrides
        if let Ok(v) = env::var("IDENTITY_SERVICE_URL").or_else(|_| env::var("AUTH_SERVICE_URL")) {
            self.identity.base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("IDENTITY_TIMEOUT_MS") {
            self.identity.timeout_ms = v.parse().unwrap_or(self.identity.timeout_ms);
        }

        // Store overrides
        match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => self.store.backend = StoreBackend::Memory,
            Ok("postgres") => self.store.backend = StoreBackend::Postgres,
            _ => {}
        }
        if self.environment != Environment::Production {
            if let Ok(path) = env::var("STORE_CREDENTIALS_FILE") {
                self.store.credentials = StoreCredentials::File(PathBuf::from(path));
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }

        // Trip overrides
        if let Ok(v) = env::var("TRIP_INVITE_MAX_RETRIES") {
            self.trips.invite_max_retries = v.parse().unwrap_or(self.trips.invite_max_retries);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            identity: IdentityConfig {
                base_url: "http://localhost:4000".to_string(),
                timeout_ms: 5000,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                credentials: StoreCredentials::Ambient,
                max_connections: 5,
            },
            trips: TripConfig { invite_max_retries: 5 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            identity: IdentityConfig {
                base_url: "http://identity:4000".to_string(),
                timeout_ms: 3000,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                credentials: StoreCredentials::Ambient,
                max_connections: 10,
            },
            trips: TripConfig { invite_max_retries: 5 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            identity: IdentityConfig {
                base_url: "http://identity:4000".to_string(),
                timeout_ms: 3000,
            },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                credentials: StoreCredentials::Ambient,
                max_connections: 20,
            },
            trips: TripConfig { invite_max_retries: 5 },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }

    /// Resolve the Postgres connection URL for the configured credential mode.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        let raw = match &self.store.credentials {
            StoreCredentials::File(path) => std::fs::read_to_string(path)
                .map_err(|source| ConfigError::CredentialFile {
                    path: path.clone(),
                    source,
                })?
                .trim()
                .to_string(),
            StoreCredentials::Ambient => {
                env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?
            }
        };

        url::Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
            name: "DATABASE_URL",
            reason: e.to_string(),
        })?;
        Ok(raw)
    }

    /// Identity gateway base URL, validated.
    pub fn identity_url(&self) -> Result<url::Url, ConfigError> {
        url::Url::parse(&self.identity.base_url).map_err(|e| ConfigError::InvalidUrl {
            name: "IDENTITY_SERVICE_URL",
            reason: e.to_string(),
        })
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
