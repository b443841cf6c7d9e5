//! Configuration management for index-provisioner
//!
//! Configuration is optional: every value has a default, a TOML file can
//! override any of them, and CLI flags override the file.

mod defaults;

pub use defaults::*;

use crate::engine::{HealthStatus, RetryPolicy};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Search engine base URL
    #[serde(default = "default_engine_url")]
    pub engine_url: String,

    /// Target index name
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// Readiness gate configuration
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// HTTP retry and timeout configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Schema parameters
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Query template management
    #[serde(default)]
    pub templates: TemplatesConfig,
}

/// Readiness polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessConfig {
    /// Give up after this many seconds
    #[serde(default = "default_readiness_timeout")]
    pub timeout_secs: u64,

    /// Fixed delay between probes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Timeout of a single probe
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Minimum acceptable cluster status
    #[serde(default = "default_wait_for_status")]
    pub wait_for_status: HealthStatus,
}

/// HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,

    /// Response statuses retried with backoff
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_create_timeout")]
    pub create_timeout_secs: u64,
}

/// Schema configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Dotted field paths compared for drift detection
    #[serde(default = "default_fingerprint_fields")]
    pub fingerprint_fields: Vec<String>,

    #[serde(default = "default_max_ngram_diff")]
    pub max_ngram_diff: u32,

    #[serde(default = "default_total_fields_limit")]
    pub total_fields_limit: u32,

    #[serde(default = "default_ngram_min")]
    pub ngram_min: u32,

    #[serde(default = "default_ngram_max")]
    pub ngram_max: u32,

    #[serde(default = "default_edge_ngram_min")]
    pub edge_ngram_min: u32,

    #[serde(default = "default_edge_ngram_max")]
    pub edge_ngram_max: u32,
}

/// Template configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Upsert the built-in query templates as part of `init`
    #[serde(default = "default_templates_enabled")]
    pub enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_url: default_engine_url(),
            index_name: default_index_name(),
            readiness: ReadinessConfig::default(),
            http: HttpConfig::default(),
            schema: SchemaConfig::default(),
            templates: TemplatesConfig::default(),
        }
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_readiness_timeout(),
            poll_interval_secs: default_poll_interval(),
            probe_timeout_secs: default_probe_timeout(),
            wait_for_status: default_wait_for_status(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_retries: default_http_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            retry_statuses: default_retry_statuses(),
            request_timeout_secs: default_request_timeout(),
            create_timeout_secs: default_create_timeout(),
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            fingerprint_fields: default_fingerprint_fields(),
            max_ngram_diff: default_max_ngram_diff(),
            total_fields_limit: default_total_fields_limit(),
            ngram_min: default_ngram_min(),
            ngram_max: default_ngram_max(),
            edge_ngram_min: default_edge_ngram_min(),
            edge_ngram_max: default_edge_ngram_max(),
        }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            enabled: default_templates_enabled(),
        }
    }
}

impl HttpConfig {
    /// Retry policy for individual engine requests
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff_base_ms),
            max_delay: Duration::from_millis(self.backoff_max_ms),
            retry_statuses: self.retry_statuses.clone(),
        }
    }
}

impl Config {
    /// Get the default config file path (~/.config/index-provisioner/config.toml)
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("index-provisioner")
            .join("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, else the default path if present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Self::default_config_path();
        if default_path.exists() {
            Self::load(&default_path)
        } else {
            debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn with_overrides(mut self, engine_url: Option<String>, index_name: Option<String>) -> Self {
        if let Some(url) = engine_url {
            self.engine_url = url;
        }
        if let Some(index) = index_name {
            self.index_name = index;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.engine_url)
            .map_err(|e| Error::Config(format!("engine_url '{}' is invalid: {}", self.engine_url, e)))?;

        if self.index_name.trim().is_empty() {
            return Err(Error::Config("index_name must not be empty".to_string()));
        }

        let positive = [
            ("readiness.timeout_secs", self.readiness.timeout_secs),
            ("readiness.poll_interval_secs", self.readiness.poll_interval_secs),
            ("readiness.probe_timeout_secs", self.readiness.probe_timeout_secs),
            ("http.request_timeout_secs", self.http.request_timeout_secs),
            ("http.create_timeout_secs", self.http.create_timeout_secs),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::Config(format!("{} must be positive", name)));
            }
        }

        if self.readiness.probe_timeout_secs >= self.readiness.poll_interval_secs {
            return Err(Error::Config(
                "readiness.probe_timeout_secs must be < readiness.poll_interval_secs".to_string(),
            ));
        }

        if self.schema.fingerprint_fields.is_empty() {
            return Err(Error::Config(
                "schema.fingerprint_fields must name at least one field".to_string(),
            ));
        }

        let schema = &self.schema;
        if schema.ngram_min > schema.ngram_max || schema.edge_ngram_min > schema.edge_ngram_max {
            return Err(Error::Config(
                "schema ngram minimums must be <= their maximums".to_string(),
            ));
        }

        // The engine bounds only ngram spreads by max_ngram_diff, not edge ngrams
        let spread = schema.ngram_max - schema.ngram_min;
        if schema.max_ngram_diff < spread {
            return Err(Error::Config(format!(
                "schema.max_ngram_diff ({}) is smaller than the ngram spread ({})",
                schema.max_ngram_diff, spread
            )));
        }

        Ok(())
    }
}
