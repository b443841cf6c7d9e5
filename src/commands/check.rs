//! Check command: read-only drift report

use crate::config::Config;
use crate::engine::SearchEngineClient;
use crate::error::{Error, Result};
use crate::reconcile::ReconciliationEngine;
use crate::schema::{address_places, Comparison, Diff, FingerprintField};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// Drift report for the configured index
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub index: String,
    pub schema_version: String,
    pub exists: bool,
    pub compatible: bool,
    pub fingerprint: Vec<FingerprintField>,
    pub diff: Diff,
    pub checked_at: DateTime<Utc>,
}

impl CheckReport {
    /// The error an incompatible index maps to, for the exit status
    pub fn status_error(&self) -> Option<Error> {
        if self.compatible {
            None
        } else if !self.exists {
            Some(Error::IndexNotFound(self.index.clone()))
        } else {
            Some(Error::SchemaDrift {
                index: self.index.clone(),
                diff: self.diff.clone(),
            })
        }
    }
}

/// Compare the live index with the desired schema without writing anything
pub async fn cmd_check(config: &Config, client: &dyn SearchEngineClient) -> Result<CheckReport> {
    let desired = address_places(&config.index_name, &config.schema)?;
    info!("Checking index '{}'", desired.index_name());

    let comparison = ReconciliationEngine::new(client).check(&desired).await?;
    let exists = !matches!(comparison, Comparison::Absent);
    let compatible = comparison.is_compatible();

    Ok(CheckReport {
        index: desired.index_name().to_string(),
        schema_version: desired.version().to_string(),
        exists,
        compatible,
        fingerprint: desired.fingerprint().to_vec(),
        diff: comparison.into_diff(&desired),
        checked_at: Utc::now(),
    })
}

/// Print a check report to console
pub fn print_check(report: &CheckReport) {
    println!("\nIndex '{}' (schema {})", report.index, report.schema_version);
    println!("Fingerprint:");
    for field in &report.fingerprint {
        println!("  {}: {}", field.path, field.expected_type);
    }

    if !report.exists {
        println!("\n✗ Index does not exist. Run 'index-provisioner init' to create it.");
    } else if report.compatible {
        println!("\n✓ Mapping matches");
    } else {
        println!("\n✗ Mapping has drifted:");
        for mismatch in report.diff.entries() {
            println!("  {}", mismatch);
        }
        println!("Rerun 'index-provisioner init --force-recreate' after stopping writers.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::FakeEngine;
    use serde_json::json;

    #[tokio::test]
    async fn test_check_absent_index() {
        let engine = FakeEngine::new();
        let report = cmd_check(&Config::default(), &engine).await.unwrap();

        assert!(!report.exists);
        assert!(!report.compatible);
        assert_eq!(report.diff.len(), 2);
        assert!(matches!(report.status_error(), Some(Error::IndexNotFound(_))));
    }

    #[tokio::test]
    async fn test_check_drifted_index() {
        let config = Config::default();
        let engine = FakeEngine::new().with_index(
            &config.index_name,
            json!({
                "properties": {
                    "centroid": {"type": "geo_point"},
                    "address_parts": {"type": "object", "properties": {}}
                }
            }),
        );

        let report = cmd_check(&config, &engine).await.unwrap();
        assert!(report.exists);
        assert!(!report.compatible);
        assert_eq!(report.diff.to_string(), "address_parts expected nested, got object");
        assert!(engine.writes().is_empty());
        assert_eq!(report.status_error().map(|e| e.exit_code()), Some(4));
    }

    #[tokio::test]
    async fn test_check_compatible_index() {
        let config = Config::default();
        let desired = address_places(&config.index_name, &config.schema).unwrap();
        let engine = FakeEngine::new().with_index(&config.index_name, desired.mapping().clone());

        let report = cmd_check(&config, &engine).await.unwrap();
        assert!(report.compatible);
        assert!(report.diff.is_empty());
        assert!(report.status_error().is_none());
    }
}
