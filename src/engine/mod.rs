//! Search engine access
//!
//! This module defines the narrow contract the provisioner needs from the
//! search engine and provides:
//! - An HTTP implementation for Elasticsearch-compatible engines
//! - The per-request retry policy used by that implementation

mod http_backend;
mod retry;

#[cfg(test)]
pub(crate) mod fake;

pub use http_backend::*;
pub use retry::*;

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Cluster health as reported by the engine, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Red,
    Yellow,
    Green,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Red => "red",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Green => "green",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "red" => Ok(Self::Red),
            "yellow" => Ok(Self::Yellow),
            "green" => Ok(Self::Green),
            other => Err(Error::Config(format!("Unknown cluster status '{}'", other))),
        }
    }
}

/// Observed field types keyed by dotted field path; unresolved fields are absent
pub type Fingerprint = HashMap<String, String>;

/// Operations the provisioner performs against the engine
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Probe cluster health, bounded by `timeout`
    async fn health(&self, timeout: Duration) -> Result<HealthStatus>;

    async fn index_exists(&self, index: &str) -> Result<bool>;

    /// Resolve the live type of each field; a missing index is `Error::IndexNotFound`
    async fn get_fingerprint(&self, index: &str, fields: &[&str]) -> Result<Fingerprint>;

    /// Create the index; `Error::IndexAlreadyExists` if another writer got there first
    async fn create_index(&self, index: &str, settings: &Value, mapping: &Value) -> Result<()>;

    /// Delete the index; an already-missing index counts as deleted
    async fn delete_index(&self, index: &str) -> Result<()>;

    /// Create or overwrite a stored query template
    async fn upsert_template(&self, name: &str, body: &Value) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_ordering() {
        assert!(HealthStatus::Red < HealthStatus::Yellow);
        assert!(HealthStatus::Yellow < HealthStatus::Green);
    }

    #[test]
    fn test_health_status_parse() {
        assert_eq!("YELLOW".parse::<HealthStatus>().unwrap(), HealthStatus::Yellow);
        assert!("purple".parse::<HealthStatus>().is_err());
    }
}
