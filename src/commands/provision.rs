//! Provision command: readiness, index reconciliation, templates, final validation

use crate::config::Config;
use crate::engine::{HealthStatus, SearchEngineClient};
use crate::error::Result;
use crate::progress::spinner;
use crate::readiness::ReadinessGate;
use crate::reconcile::ReconciliationEngine;
use crate::schema::address_places;
use crate::templates::{builtin_templates, TemplateManager};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Options for a provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    /// Delete and rebuild an existing index
    pub force_recreate: bool,
    /// Upsert the built-in query templates
    pub manage_templates: bool,
    /// Gate on cluster health first
    pub wait: bool,
    /// Show a spinner while waiting
    pub show_progress: bool,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            force_recreate: false,
            manage_templates: true,
            wait: true,
            show_progress: false,
        }
    }
}

/// Summary of a successful provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionReport {
    pub engine_url: String,
    pub index: String,
    pub schema_version: String,
    pub cluster_status: Option<HealthStatus>,
    pub outcome: String,
    pub templates: Vec<String>,
    pub finished_at: DateTime<Utc>,
}

/// Block until the engine is usable or the readiness deadline passes
pub async fn wait_until_ready(
    config: &Config,
    client: &dyn SearchEngineClient,
    show_progress: bool,
) -> Result<HealthStatus> {
    let gate = ReadinessGate::from_config(&config.readiness)?;
    let bar = spinner(
        format!("Waiting for search engine at {}", config.engine_url),
        show_progress,
    );
    let result = gate.await_ready(client).await;
    bar.finish_and_clear();
    result
}

/// Wait for the engine, reconcile the index, upsert templates, and validate
pub async fn cmd_provision(
    config: &Config,
    client: &dyn SearchEngineClient,
    options: ProvisionOptions,
) -> Result<ProvisionReport> {
    let desired = address_places(&config.index_name, &config.schema)?;

    let cluster_status = if options.wait {
        Some(wait_until_ready(config, client, options.show_progress).await?)
    } else {
        None
    };

    let reconciler = ReconciliationEngine::new(client);
    let outcome = reconciler
        .reconcile(&desired, options.force_recreate)
        .await
        .into_result()?;

    let templates = if options.manage_templates {
        TemplateManager::new(client)
            .ensure_templates(&builtin_templates())
            .await?
    } else {
        info!("Template management disabled, skipping templates");
        Vec::new()
    };

    // Another provisioner may have replaced the index while templates were applied
    reconciler.validate(&desired).await?;
    info!("Provisioning of '{}' done, mapping validation passed", desired.index_name());

    Ok(ProvisionReport {
        engine_url: config.engine_url.clone(),
        index: desired.index_name().to_string(),
        schema_version: desired.version().to_string(),
        cluster_status,
        outcome: outcome.label().to_string(),
        templates,
        finished_at: Utc::now(),
    })
}

/// Wait for the engine and upsert the built-in templates only
pub async fn cmd_templates(
    config: &Config,
    client: &dyn SearchEngineClient,
    wait: bool,
    show_progress: bool,
) -> Result<Vec<String>> {
    if wait {
        wait_until_ready(config, client, show_progress).await?;
    }
    TemplateManager::new(client)
        .ensure_templates(&builtin_templates())
        .await
}

/// Print a provisioning report to console
pub fn print_report(report: &ProvisionReport) {
    println!("\n✓ Index '{}' {}", report.index, report.outcome);
    println!("  Engine: {}", report.engine_url);
    println!("  Schema version: {}", report.schema_version);
    if let Some(status) = report.cluster_status {
        println!("  Cluster status: {}", status);
    }
    if report.templates.is_empty() {
        println!("  Templates: not managed");
    } else {
        println!("  Templates: {}", report.templates.join(", "));
    }
    println!("  Mapping validation: passed");
}
