//! Configuration loading utilities

use crate::Config;
use qatrend_common::Result as QaTrendResult;
use std::env;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        /// Variable name
        var: String,
        /// Underlying parse failure
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for qatrend_common::QaTrendError {
    fn from(err: ConfigError) -> Self {
        qatrend_common::QaTrendError::config_with_source(err.to_string(), err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        debug!("Loaded configuration file {}", path.as_ref().display());
        Self::load_from_str(&content, |var| env::var(var).ok())
    }

    /// Parse YAML, apply overrides from `lookup`, and validate
    pub fn load_from_str<F>(content: &str, lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = serde_yaml::from_str(content)?;
        Self::apply_overrides(&mut config, lookup)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from the standard locations.
    ///
    /// `QATREND_CONFIG_PATH` wins, then `qatrend.yaml` / `qatrend.yml` in the
    /// working directory, else defaults. Environment overrides apply in every case.
    pub fn load() -> QaTrendResult<Config> {
        let config = if let Ok(config_path) = env::var("QATREND_CONFIG_PATH") {
            Self::load_config(&config_path)?
        } else if Path::new("qatrend.yaml").exists() {
            Self::load_config("qatrend.yaml")?
        } else if Path::new("qatrend.yml").exists() {
            Self::load_config("qatrend.yml")?
        } else {
            info!("No configuration file found, using defaults");
            let mut config = Config::default();
            Self::apply_overrides(&mut config, |var| env::var(var).ok())?;
            config.validate_all().map_err(ConfigError::ValidationError)?;
            config
        };

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> QaTrendResult<Config> {
        Ok(Self::load_config(path)?)
    }

    fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
        F: Fn(&str) -> Option<String>,
    {
        lookup(var)
            .map(|raw| {
                raw.trim().parse::<T>().map_err(|e| ConfigError::EnvParseError {
                    var: var.to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()
    }

    /// Apply `QATREND_*` overrides resolved through `lookup`
    fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Source configuration overrides
        if let Some(url) = lookup("QATREND_BASE_URL") {
            config.source.base_url = url;
        }

        if let Some(api_key) = lookup("QATREND_API_KEY") {
            config.source.api_key = Some(api_key);
        }

        if let Some(token) = lookup("QATREND_JWT_TOKEN") {
            config.source.jwt_token = Some(token);
        }

        if let Some(timeout) = Self::parse_var(&lookup, "QATREND_TIMEOUT")? {
            config.source.timeout_seconds = timeout;
        }

        if let Some(retries) = Self::parse_var(&lookup, "QATREND_MAX_RETRIES")? {
            config.source.max_retries = retries;
        }

        // Cache configuration overrides
        if let Some(ttl) = Self::parse_var(&lookup, "QATREND_CACHE_TTL")? {
            config.cache.ttl_seconds = ttl;
        }

        // Logging configuration overrides
        if let Some(level) = lookup("QATREND_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(())
    }
}
