//! Configuration management for cellwatch
//!
//! Configuration is read from a TOML file, then selected values can be
//! overridden from the environment. All sections are optional; missing keys
//! fall back to the defaults below.
//!
//! ```toml
//! api_url = "http://localhost:8080"
//! report_endpoint = "/report"
//!
//! [monitored_blocks]
//! method = "PUT"
//! endpoint = "/monitor"
//! update = { method = "PATCH" }
//!
//! [[monitored_blocks.locations]]
//! world = "world"
//! x = 0
//! y = 64
//! z = 0
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::report::{Endpoint, Endpoints, Route};

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse TOML config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range or malformed
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// An HTTP method name is not a valid token
    #[error("Invalid HTTP method '{method}' for '{field}'")]
    InvalidMethod { field: String, method: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL every endpoint path is appended to
    #[serde(default)]
    pub api_url: String,

    /// Path of the one-shot command report endpoint
    #[serde(default = "default_report_endpoint")]
    pub report_endpoint: String,

    /// HTTP method of the command report endpoint
    #[serde(default = "default_report_method")]
    pub report_method: String,

    /// Watch list and monitor endpoints
    #[serde(default)]
    pub monitored_blocks: MonitoredBlocksConfig,

    /// Outbound delivery settings
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Watch list and the monitor channels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoredBlocksConfig {
    /// Method shared by the update and batch channels
    #[serde(default = "default_monitor_method")]
    pub method: String,

    /// Path shared by the update and batch channels
    #[serde(default = "default_monitor_endpoint")]
    pub endpoint: String,

    /// Per-change update channel overrides
    #[serde(default)]
    pub update: ChannelConfig,

    /// Startup batch channel overrides
    #[serde(default)]
    pub batch: ChannelConfig,

    /// How repeated coordinates in `locations` are handled
    #[serde(default)]
    pub duplicates: DuplicatePolicy,

    /// Raw watch entries; each should be a table with `world`, `x`, `y`, `z`
    #[serde(default)]
    pub locations: Vec<toml::Value>,
}

/// Optional overrides for one monitor channel
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub method: Option<String>,
    pub endpoint: Option<String>,
}

/// Handling of a coordinate that appears more than once in the watch list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Skip the later entry and keep the first id
    #[default]
    Reject,
    /// The later entry takes over the coordinate with a fresh id
    LastWins,
}

/// Outbound delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum reports queued or in flight; further reports are dropped
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_report_endpoint() -> String {
    String::from("/report")
}

fn default_report_method() -> String {
    String::from("POST")
}

fn default_monitor_method() -> String {
    String::from("PUT")
}

fn default_monitor_endpoint() -> String {
    String::from("/monitor")
}

fn default_timeout() -> u64 {
    10
}

fn default_max_pending() -> usize {
    64
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("text")
}

impl Default for MonitoredBlocksConfig {
    fn default() -> Self {
        Self {
            method: default_monitor_method(),
            endpoint: default_monitor_endpoint(),
            update: ChannelConfig::default(),
            batch: ChannelConfig::default(),
            duplicates: DuplicatePolicy::default(),
            locations: Vec::new(),
        }
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_pending: default_max_pending(),
        }
    }
}

impl ReporterConfig {
    /// Get request timeout as Duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            report_endpoint: default_report_endpoint(),
            report_method: default_report_method(),
            monitored_blocks: MonitoredBlocksConfig::default(),
            reporter: ReporterConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a file and apply environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `CELLWATCH_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CELLWATCH_API_URL") {
            self.api_url = url;
        }
        if let Some(level) = lookup("CELLWATCH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CELLWATCH_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Whether a usable base API URL has been set
    pub fn is_api_url_configured(&self) -> bool {
        !self.api_url.trim().is_empty()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_api_url_configured() {
            return Err(ConfigError::InvalidValue {
                field: "api_url".to_string(),
                reason: "must be set to the web service's base URL".to_string(),
            });
        }

        let parsed = url::Url::parse(&self.api_url).map_err(|e| ConfigError::InvalidValue {
            field: "api_url".to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                field: "api_url".to_string(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        if self.reporter.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reporter.timeout_secs".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.reporter.max_pending == 0 {
            return Err(ConfigError::InvalidValue {
                field: "reporter.max_pending".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        self.endpoints().map(|_| ())
    }

    /// Resolve the three report endpoints
    pub fn endpoints(&self) -> Result<Endpoints, ConfigError> {
        let monitor = &self.monitored_blocks;
        let channel = |route: Route, overrides: &ChannelConfig| {
            Endpoint::new(
                route,
                &self.api_url,
                overrides.endpoint.as_deref().unwrap_or(&monitor.endpoint),
                overrides.method.as_deref().unwrap_or(&monitor.method),
            )
        };

        Ok(Endpoints {
            command: Endpoint::new(
                Route::Command,
                &self.api_url,
                &self.report_endpoint,
                &self.report_method,
            )?,
            batch: channel(Route::MonitorBatch, &monitor.batch)?,
            update: channel(Route::MonitorUpdate, &monitor.update)?,
        })
    }
}
