//! Configuration management for the coffee tracker server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with CT_ prefix

use std::path::PathBuf;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{DayCountMode, Settings};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    pub server: ServerConfig,

    pub storage: StorageConfig,

    pub statistics: StatisticsConfig,

    pub events: EventsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,

    pub host: String,
}

/// Which record store backs the server
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Files,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory for the file backend
    pub data_dir: PathBuf,

    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

/// Defaults for the statistics view, used until the user saves settings
#[derive(Debug, Deserialize, Clone)]
pub struct StatisticsConfig {
    pub day_count_mode: DayCountMode,

    pub exclude_empty: bool,

    /// Offset used to decide which calendar day a note belongs to
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventsConfig {
    /// Buffered change notifications per subscriber
    pub channel_capacity: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CT_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("storage.backend", "files")?
            .set_default("storage.data_dir", "data/records")?
            .set_default("storage.database.url", "postgres://localhost/coffee_tracker")?
            .set_default("storage.database.max_connections", 5)?
            .set_default("storage.database.min_connections", 1)?
            .set_default("statistics.day_count_mode", "coffee_day")?
            .set_default("statistics.exclude_empty", false)?
            .set_default("statistics.utc_offset_minutes", 0)?
            .set_default("events.channel_capacity", 64)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CT_ prefix)
            .add_source(
                Environment::with_prefix("CT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Settings served before the user has saved any
    pub fn default_settings(&self) -> Settings {
        Settings {
            day_count_mode: self.statistics.day_count_mode,
            exclude_empty_from_stats: self.statistics.exclude_empty,
            ..Settings::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                data_dir: PathBuf::from("data/records"),
                database: DatabaseConfig {
                    url: "postgres://localhost/coffee_tracker".to_string(),
                    max_connections: 5,
                    min_connections: 1,
                },
            },
            statistics: StatisticsConfig {
                day_count_mode: DayCountMode::CoffeeDay,
                exclude_empty: false,
                utc_offset_minutes: 0,
            },
            events: EventsConfig {
                channel_capacity: 64,
            },
        }
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
