//! Application configuration structures

use qatrend_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationErrors};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Default analysis parameters, overridable per request
    #[validate]
    pub analysis: TrendConfig,

    /// Result cache settings
    #[validate]
    pub cache: CacheSettings,

    /// QA platform record source settings
    #[validate]
    pub source: SourceConfig,

    /// Logging settings
    #[validate]
    pub logging: LogSettings,
}

impl Config {
    /// Comprehensive validation of the entire configuration
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;
        self.analysis.validate_thresholds()?;
        self.source.endpoints.validate_paths()?;
        Ok(())
    }
}

/// Tunable parameters of a single trend analysis.
///
/// A value object: two configs with equal fields request identical results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TrendConfig {
    /// Moving-average window in days
    #[validate(range(min = 1, max = 365, message = "Smoothing window must be between 1 and 365 days"))]
    pub smoothing_window: usize,

    /// Confidence level in (0, 1); informational only
    pub confidence_level: f64,

    /// Z-score cutoff above which a residual is an anomaly
    pub anomaly_threshold: f64,

    /// Number of days to forecast
    #[validate(range(max = 365, message = "Forecast horizon cannot exceed 365 days"))]
    pub forecast_periods: usize,

    /// Whether to look for weekly/monthly seasonality
    pub seasonality_detection: bool,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 7,
            confidence_level: 0.95,
            anomaly_threshold: 2.0,
            forecast_periods: 14,
            seasonality_detection: true,
        }
    }
}

impl TrendConfig {
    /// Fill every field the override leaves unset from `self`.
    pub fn merged(&self, overrides: &TrendConfigOverride) -> Self {
        Self {
            smoothing_window: overrides.smoothing_window.unwrap_or(self.smoothing_window),
            confidence_level: overrides.confidence_level.unwrap_or(self.confidence_level),
            anomaly_threshold: overrides.anomaly_threshold.unwrap_or(self.anomaly_threshold),
            forecast_periods: overrides.forecast_periods.unwrap_or(self.forecast_periods),
            seasonality_detection: overrides
                .seasonality_detection
                .unwrap_or(self.seasonality_detection),
        }
    }

    /// Field ranges plus the floating point bounds
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.validate()?;
        self.validate_thresholds()
    }

    /// Floating point bounds that the derive attributes cannot express
    pub fn validate_thresholds(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = crate::validation::validate_open_unit_interval(self.confidence_level) {
            errors.add("confidence_level", err);
        }

        if let Err(err) = crate::validation::validate_positive(self.anomaly_threshold) {
            errors.add("anomaly_threshold", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Per-request partial [`TrendConfig`]; unset fields fall back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfigOverride {
    /// Moving-average window in days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothing_window: Option<usize>,
    /// Confidence level in (0, 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_level: Option<f64>,
    /// Z-score cutoff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_threshold: Option<f64>,
    /// Forecast horizon in days
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_periods: Option<usize>,
    /// Seasonality detection toggle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seasonality_detection: Option<bool>,
}

impl TrendConfigOverride {
    /// Whether the override leaves every field unset
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Result cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheSettings {
    /// Time-to-live of a cached analysis in seconds
    #[validate(range(min = 1, max = 86400, message = "Cache TTL must be between 1 second and 1 day"))]
    pub ttl_seconds: u64,

    /// Maximum number of cached analyses
    #[validate(range(min = 1, message = "Cache capacity must be at least 1"))]
    pub max_capacity: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 600,
            max_capacity: 1000,
        }
    }
}

impl CacheSettings {
    /// TTL as a [`Duration`]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// QA platform API settings used by the HTTP record source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SourceConfig {
    /// API base URL, e.g. `http://localhost:3001/api/v1`
    #[validate(url(message = "Source base URL must be a valid URL"))]
    pub base_url: String,

    /// API key sent as `X-API-Key`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// JWT sent as a bearer token; preferred over the API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt_token: Option<String>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,

    /// Maximum number of retries for transient failures
    #[validate(range(max = 10, message = "Max retries cannot exceed 10"))]
    pub max_retries: usize,

    /// Requests per second allowed against the API
    #[validate(range(min = 1, max = 1000, message = "Rate limit must be between 1 and 1000 requests per second"))]
    pub rate_limit_per_sec: u32,

    /// Idle pooled connections kept per host
    pub max_idle_per_host: usize,

    /// Records requested per page
    #[validate(range(min = 1, max = 1000, message = "Page size must be between 1 and 1000"))]
    pub page_size: u32,

    /// Endpoint paths per analysis kind
    pub endpoints: EndpointsConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001/api/v1".to_string(),
            api_key: None,
            jwt_token: None,
            timeout_seconds: 30,
            max_retries: 3,
            rate_limit_per_sec: 10,
            max_idle_per_host: 10,
            page_size: 100,
            endpoints: EndpointsConfig::default(),
        }
    }
}

impl SourceConfig {
    /// Create a configuration pointing at `base_url` with default tuning
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Authenticate with an API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Authenticate with a JWT bearer token
    pub fn with_jwt_token(mut self, jwt_token: impl Into<String>) -> Self {
        self.jwt_token = Some(jwt_token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the maximum retry attempts
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the rate limit
    pub fn with_rate_limit(mut self, rate_limit_per_sec: u32) -> Self {
        self.rate_limit_per_sec = rate_limit_per_sec;
        self
    }

    /// Set the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }
}

/// Endpoint paths, relative to the base URL, serving each record type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Quality assessments carrying `overall_score`
    pub quality: String,
    /// Assessment errors, one record per error occurrence
    pub error_rate: String,
    /// Processed files carrying `word_count` and `processing_time`
    pub efficiency: String,
    /// User activity events carrying `user_id`
    pub engagement: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            quality: "/analytics/assessments".to_string(),
            error_rate: "/analytics/errors".to_string(),
            efficiency: "/analytics/files".to_string(),
            engagement: "/analytics/activity".to_string(),
        }
    }
}

impl EndpointsConfig {
    /// Every endpoint must be an absolute path
    pub fn validate_paths(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        for (field, path) in [
            ("quality", &self.quality),
            ("error_rate", &self.error_rate),
            ("efficiency", &self.efficiency),
            ("engagement", &self.engagement),
        ] {
            if let Err(err) = crate::validation::validate_endpoint_path(path) {
                errors.add(field, err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LogSettings {
    /// Log level (trace, debug, info, warn, error)
    #[validate(custom = "crate::validation::validate_log_level")]
    pub level: String,

    /// Optional log file path
    pub file: Option<String>,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json: false,
        }
    }
}

impl LogSettings {
    /// Translate into the subscriber configuration
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.level.clone(),
            json_format: self.json,
            pretty_format: !self.json && self.file.is_none(),
            file_path: self.file.clone(),
            ..LoggingConfig::default()
        }
    }
}
