//! Index reconciliation.
//!
//! One pass decides between no-op, create, fail, and force-recreate by
//! comparing the desired schema with the live index. The decision itself is
//! never retried; only the underlying requests are. The live index is never
//! patched field by field: it is either created whole or deleted whole.

use crate::engine::SearchEngineClient;
use crate::error::{Error, Result};
use crate::schema::{compare, Comparison, LiveIndexState, SchemaDescriptor};
use std::fmt;
use tracing::{debug, info, warn};

/// Terminal result of one reconciliation run
#[derive(Debug)]
pub enum Outcome {
    /// The live index already matched; nothing was written
    Skipped,
    Created,
    Recreated,
    Failed(Error),
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Skipped => "skipped",
            Outcome::Created => "created",
            Outcome::Recreated => "recreated",
            Outcome::Failed(_) => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Turn a failed outcome back into its error
    pub fn into_result(self) -> Result<Outcome> {
        match self {
            Outcome::Failed(e) => Err(e),
            other => Ok(other),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Failed(e) => write!(f, "failed: {}", e),
            other => f.write_str(other.label()),
        }
    }
}

pub struct ReconciliationEngine<'a> {
    client: &'a dyn SearchEngineClient,
}

impl<'a> ReconciliationEngine<'a> {
    pub fn new(client: &'a dyn SearchEngineClient) -> Self {
        Self { client }
    }

    /// Observe the live state of the desired index
    pub async fn observe(&self, desired: &SchemaDescriptor) -> Result<LiveIndexState> {
        let index = desired.index_name();
        if !self.client.index_exists(index).await? {
            return Ok(LiveIndexState::absent());
        }

        match self
            .client
            .get_fingerprint(index, &desired.fingerprint_paths())
            .await
        {
            Ok(fingerprint) => Ok(LiveIndexState::present(fingerprint)),
            // Deleted between the two calls
            Err(Error::IndexNotFound(_)) => Ok(LiveIndexState::absent()),
            Err(e) => Err(e),
        }
    }

    /// Observe and compare without writing anything
    pub async fn check(&self, desired: &SchemaDescriptor) -> Result<Comparison> {
        let observed = self.observe(desired).await?;
        Ok(compare(desired, &observed))
    }

    /// Confirm the live index matches the desired fingerprint
    pub async fn validate(&self, desired: &SchemaDescriptor) -> Result<()> {
        let comparison = self.check(desired).await?;
        if comparison.is_compatible() {
            return Ok(());
        }

        let diff = comparison.into_diff(desired);
        warn!("Validation of '{}' failed: {}", desired.index_name(), diff);
        Err(Error::PostValidation {
            index: desired.index_name().to_string(),
            diff,
        })
    }

    pub async fn reconcile(&self, desired: &SchemaDescriptor, force_recreate: bool) -> Outcome {
        match self.run(desired, force_recreate).await {
            Ok(outcome) => outcome,
            Err(e) => Outcome::Failed(e),
        }
    }

    async fn run(&self, desired: &SchemaDescriptor, force_recreate: bool) -> Result<Outcome> {
        let index = desired.index_name();
        let observed = self.observe(desired).await?;

        if !observed.exists {
            info!("Index '{}' does not exist, creating schema {}", index, desired.version());
            return self.create(desired, Outcome::Created).await;
        }

        if force_recreate {
            info!(
                "Index '{}' exists, deleting because force-recreate is enabled",
                index
            );
            self.client.delete_index(index).await?;
            return self.create(desired, Outcome::Recreated).await;
        }

        let diff = compare(desired, &observed).into_diff(desired);
        if diff.is_empty() {
            info!("Index '{}' already exists and its mapping matches, skipping", index);
            return Ok(Outcome::Skipped);
        }

        warn!("Index '{}' exists but its mapping has drifted: {}", index, diff);
        Err(Error::SchemaDrift {
            index: index.to_string(),
            diff,
        })
    }

    /// Create the index and re-validate; `success` is returned only if the
    /// resulting fingerprint matches.
    async fn create(&self, desired: &SchemaDescriptor, success: Outcome) -> Result<Outcome> {
        let index = desired.index_name();
        let outcome = match self
            .client
            .create_index(index, desired.settings(), desired.mapping())
            .await
        {
            Ok(()) => success,
            Err(Error::IndexAlreadyExists(_)) => {
                debug!("Index '{}' was created concurrently", index);
                Outcome::Skipped
            }
            Err(e) => return Err(e),
        };

        self.validate(desired).await?;
        info!("Index '{}' {}", index, outcome.label());
        Ok(outcome)
    }
}
