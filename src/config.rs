use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_EVENT_BUFFER: usize = 256;
const DEFAULT_PAGE_SIZE: u64 = 20;
const MAX_PAGE_SIZE: u64 = 500;

/// Application configuration for the field-service core.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment ("development", "test", "production")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level filter (overridable via RUST_LOG)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Capacity of the domain event channel
    #[serde(default = "default_event_buffer")]
    #[validate(range(min = 1))]
    pub event_buffer: usize,

    /// Default page size for list queries
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 500))]
    pub default_page_size: u64,
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            event_buffer: default_event_buffer(),
            default_page_size: default_page_size(),
        }
    }
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Clamps a caller-supplied page size to the configured bounds.
    pub fn clamp_page_size(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_page_size)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/{environment}.toml` (if present) layered
/// with `FIELDOPS_*` environment variables.
pub fn load_config() -> Result<AppConfig, ConfigurationError> {
    let environment = env::var("FIELDOPS_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());
    let file_path = format!("{}/{}.toml", CONFIG_DIR, environment);

    let mut builder = Config::builder();
    if Path::new(&file_path).exists() {
        builder = builder.add_source(File::with_name(&file_path));
    }
    let settings = builder
        .add_source(Environment::with_prefix("FIELDOPS").separator("__"))
        .set_default("environment", environment.clone())?
        .build()?;

    let config: AppConfig = settings.try_deserialize()?;
    config.validate()?;

    info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "configuration loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.environment, "development");
        assert_eq!(config.default_page_size, 20);
        assert!(!config.is_production());
    }

    #[test]
    fn page_size_is_clamped() {
        let config = AppConfig::default();
        assert_eq!(config.clamp_page_size(None), 20);
        assert_eq!(config.clamp_page_size(Some(0)), 1);
        assert_eq!(config.clamp_page_size(Some(10_000)), MAX_PAGE_SIZE);
        assert_eq!(config.clamp_page_size(Some(50)), 50);
    }

    #[test]
    fn zero_event_buffer_is_rejected() {
        let config = AppConfig {
            event_buffer: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
