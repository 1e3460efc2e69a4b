//! Configuration management for the procurement backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with the PROCUREMENT prefix

use config::builder::{ConfigBuilder, DefaultState};
use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// JWT verification configuration
    pub jwt: JwtConfig,

    /// Transition event delivery
    pub events: EventsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Keep documents in process memory instead of PostgreSQL
    pub in_memory: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key used to verify bearer tokens (HS256)
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    /// Endpoint receiving a signed POST per committed transition
    pub webhook_url: Option<String>,

    /// HMAC key for the X-Procurement-Signature header
    pub webhook_secret: Option<String>,

    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("PROCUREMENT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Self::builder(&environment)?.build()?.try_deserialize()
    }

    fn builder(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.in_memory", false)?
            .set_default("events.timeout_secs", 5)?;
        // Any other environment must supply PROCUREMENT__JWT__SECRET
        if environment == "development" {
            builder = builder.set_default("jwt.secret", "development-secret-key")?;
        }

        Ok(builder
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // PROCUREMENT__DATABASE__URL etc.
            .add_source(
                Environment::with_prefix("PROCUREMENT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            ))
    }

    /// Settings for tests and local demos: in-memory store, no webhook
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self {
            environment: "test".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 1,
                in_memory: true,
            },
            jwt: JwtConfig {
                secret: jwt_secret.to_string(),
            },
            events: EventsConfig {
                webhook_url: None,
                webhook_secret: None,
                timeout_secs: 5,
            },
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
