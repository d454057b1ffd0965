//! Configuration management for the settlement service
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with AGRI prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::QualityDeductionTable;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Persistence backend that stores confirmed orders
    pub persistence: PersistenceConfig,

    /// Quality deduction table source
    #[serde(default)]
    pub deductions: DeductionsConfig,

    /// Log output
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct PersistenceConfig {
    /// REST base URL, e.g. https://project.supabase.co/rest/v1
    #[validate(url)]
    pub base_url: String,

    /// Service API key sent as `apikey` and bearer token
    pub api_key: String,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u32,

    /// Extra attempts after a network failure
    #[validate(range(max = 10))]
    pub max_retries: u32,

    /// Delay before the first retry, grows linearly per attempt
    pub retry_backoff_ms: u64,
}

impl PersistenceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_secs))
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeductionsConfig {
    /// JSON file with deduction bands; the bundled table is used when unset
    pub table_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// "pretty" or "json"
    pub format: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("AGRI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("persistence.base_url", "http://localhost:54321/rest/v1")?
            .set_default("persistence.api_key", "")?
            .set_default("persistence.timeout_secs", 30)?
            .set_default("persistence.max_retries", 2)?
            .set_default("persistence.retry_backoff_ms", 500)?
            .set_default("log.format", "pretty")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGRI prefix)
            .add_source(
                Environment::with_prefix("AGRI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config
            .persistence
            .validate()
            .map_err(|e| ConfigError::Message(format!("invalid persistence config: {}", e)))?;
        Ok(config)
    }

    /// Load the deduction table named in the config, or the bundled one
    pub fn deduction_table(&self) -> AppResult<QualityDeductionTable> {
        match &self.deductions.table_path {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Configuration(format!("cannot read deduction table {}: {}", path, e))
                })?;
                QualityDeductionTable::from_json(&json)
                    .map_err(|e| AppError::Configuration(e.to_string()))
            }
            None => QualityDeductionTable::bundled()
                .map_err(|e| AppError::Configuration(e.to_string())),
        }
    }

    pub fn uses_json_logs(&self) -> bool {
        self.log.format.eq_ignore_ascii_case("json")
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
