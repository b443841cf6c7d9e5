//! Stored query templates
//!
//! Templates are upserted unconditionally and in order. There is no diffing or
//! versioning: overwriting with identical content is a no-op at the engine.

mod catalog;

pub use catalog::*;

use crate::engine::SearchEngineClient;
use crate::error::{Error, Result};
use serde_json::Value;
use tracing::info;

/// A named, parameterised query
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSpec {
    pub name: String,
    pub body: Value,
}

impl TemplateSpec {
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

pub struct TemplateManager<'a> {
    client: &'a dyn SearchEngineClient,
}

impl<'a> TemplateManager<'a> {
    pub fn new(client: &'a dyn SearchEngineClient) -> Self {
        Self { client }
    }

    /// Upsert every template in order and return the applied names.
    ///
    /// The first failure stops the batch; templates applied before it stay applied.
    pub async fn ensure_templates(&self, specs: &[TemplateSpec]) -> Result<Vec<String>> {
        let mut applied = Vec::with_capacity(specs.len());

        for spec in specs {
            info!("Upserting template {}", spec.name);
            self.client
                .upsert_template(&spec.name, &spec.body)
                .await
                .map_err(|e| Error::Template {
                    name: spec.name.clone(),
                    source: Box::new(e),
                })?;
            applied.push(spec.name.clone());
        }

        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fake::{Call, FakeEngine};
    use serde_json::json;

    fn specs() -> Vec<TemplateSpec> {
        vec![
            TemplateSpec::new("first", json!({"query": {"match_all": {}}})),
            TemplateSpec::new("second", json!({"size": "{{size}}"})),
            TemplateSpec::new("third", json!({"query": {"term": {"tokens": "{{keyword}}"}}})),
        ]
    }

    #[tokio::test]
    async fn test_templates_applied_in_order() {
        let engine = FakeEngine::new();
        let applied = TemplateManager::new(&engine)
            .ensure_templates(&specs())
            .await
            .unwrap();

        assert_eq!(applied, vec!["first", "second", "third"]);
        assert_eq!(
            engine.writes(),
            vec![
                Call::UpsertTemplate("first".to_string()),
                Call::UpsertTemplate("second".to_string()),
                Call::UpsertTemplate("third".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_first_failure_stops_batch() {
        let engine = FakeEngine::new().failing_template("second");
        let err = TemplateManager::new(&engine)
            .ensure_templates(&specs())
            .await
            .unwrap_err();

        match err {
            Error::Template { name, source } => {
                assert_eq!(name, "second");
                assert!(matches!(*source, Error::EngineWrite { status: 500, .. }));
            }
            other => panic!("expected template error, got {other:?}"),
        }

        // No rollback of the template applied before the failure, no continuation after it
        let stored = engine.templates();
        assert!(stored.contains_key("first"));
        assert!(!stored.contains_key("third"));
    }

    #[tokio::test]
    async fn test_rerun_yields_same_template_set() {
        let engine = FakeEngine::new();
        let manager = TemplateManager::new(&engine);

        manager.ensure_templates(&specs()).await.unwrap();
        let once = engine.templates();
        manager.ensure_templates(&specs()).await.unwrap();

        assert_eq!(engine.templates(), once);
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let engine = FakeEngine::new();
        let applied = TemplateManager::new(&engine).ensure_templates(&[]).await.unwrap();
        assert!(applied.is_empty());
        assert!(engine.calls().is_empty());
    }
}
