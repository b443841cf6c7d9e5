//! In-memory engine used by unit tests. Records every call so tests can
//! assert how many writes a run issued.

use super::{Fingerprint, HealthStatus, SearchEngineClient};
use crate::error::{Error, Result};
use crate::schema::field_type;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Health,
    Exists(String),
    Fingerprint(String),
    Create(String),
    Delete(String),
    UpsertTemplate(String),
}

impl Call {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Call::Create(_) | Call::Delete(_) | Call::UpsertTemplate(_)
        )
    }
}

/// Scripted health probe result
#[derive(Debug, Clone)]
pub enum Probe {
    Status(HealthStatus),
    Unreachable,
    Hang,
}

#[derive(Default)]
struct State {
    indices: HashMap<String, Value>,
    templates: HashMap<String, Value>,
    calls: Vec<Call>,
    probes: VecDeque<Probe>,
    default_probe: Option<Probe>,
    stored_mapping_override: Option<Value>,
    create_status: Option<u16>,
    delete_status: Option<u16>,
    race_on_create: Option<Value>,
    failing_template: Option<String>,
}

#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<State>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    pub fn with_index(self, name: &str, mapping: Value) -> Self {
        self.with_state(|s| s.indices.insert(name.to_string(), mapping));
        self
    }

    /// Probes answered in order, then `default_probe` forever
    pub fn with_probes(self, probes: Vec<Probe>, default_probe: Probe) -> Self {
        self.with_state(|s| {
            s.probes = probes.into();
            s.default_probe = Some(default_probe);
        });
        self
    }

    /// Store this mapping instead of the requested one on create
    pub fn storing_mapping(self, mapping: Value) -> Self {
        self.with_state(|s| s.stored_mapping_override = Some(mapping));
        self
    }

    pub fn failing_create(self, status: u16) -> Self {
        self.with_state(|s| s.create_status = Some(status));
        self
    }

    pub fn failing_delete(self, status: u16) -> Self {
        self.with_state(|s| s.delete_status = Some(status));
        self
    }

    /// Another provisioner creates the index with `mapping` just before our create lands
    pub fn racing_create(self, mapping: Value) -> Self {
        self.with_state(|s| s.race_on_create = Some(mapping));
        self
    }

    pub fn failing_template(self, name: &str) -> Self {
        self.with_state(|s| s.failing_template = Some(name.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.with_state(|s| s.calls.clear());
    }

    pub fn templates(&self) -> HashMap<String, Value> {
        self.with_state(|s| s.templates.clone())
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.with_state(|s| s.indices.contains_key(name))
    }
}

#[async_trait]
impl SearchEngineClient for FakeEngine {
    async fn health(&self, timeout: Duration) -> Result<HealthStatus> {
        let probe = self.with_state(|s| {
            s.calls.push(Call::Health);
            s.probes
                .pop_front()
                .or_else(|| s.default_probe.clone())
                .unwrap_or(Probe::Status(HealthStatus::Green))
        });

        match probe {
            Probe::Status(status) => Ok(status),
            Probe::Unreachable => Err(Error::Transient {
                operation: "cluster health".to_string(),
                attempts: 1,
                message: "connection refused".to_string(),
            }),
            Probe::Hang => {
                tokio::time::sleep(timeout * 10).await;
                Ok(HealthStatus::Green)
            }
        }
    }

    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.with_state(|s| {
            s.calls.push(Call::Exists(index.to_string()));
            s.indices.contains_key(index)
        }))
    }

    async fn get_fingerprint(&self, index: &str, fields: &[&str]) -> Result<Fingerprint> {
        self.with_state(|s| -> Result<Fingerprint> {
            s.calls.push(Call::Fingerprint(index.to_string()));
            let mapping = s
                .indices
                .get(index)
                .ok_or_else(|| Error::IndexNotFound(index.to_string()))?;
            Ok(fields
                .iter()
                .filter_map(|f| field_type(mapping, f).map(|t| (f.to_string(), t.to_string())))
                .collect())
        })
    }

    async fn create_index(&self, index: &str, _settings: &Value, mapping: &Value) -> Result<()> {
        self.with_state(|s| -> Result<()> {
            s.calls.push(Call::Create(index.to_string()));
            if let Some(raced) = s.race_on_create.take() {
                s.indices.insert(index.to_string(), raced);
            }
            if let Some(status) = s.create_status {
                return Err(Error::EngineWrite {
                    operation: format!("create index '{}'", index),
                    status,
                    body: "{\"error\":\"scripted\"}".to_string(),
                });
            }
            if s.indices.contains_key(index) {
                return Err(Error::IndexAlreadyExists(index.to_string()));
            }
            let stored = s
                .stored_mapping_override
                .clone()
                .unwrap_or_else(|| mapping.clone());
            s.indices.insert(index.to_string(), stored);
            Ok(())
        })
    }

    async fn delete_index(&self, index: &str) -> Result<()> {
        self.with_state(|s| -> Result<()> {
            s.calls.push(Call::Delete(index.to_string()));
            if let Some(status) = s.delete_status {
                return Err(Error::EngineWrite {
                    operation: format!("delete index '{}'", index),
                    status,
                    body: "{\"error\":\"scripted\"}".to_string(),
                });
            }
            s.indices.remove(index);
            Ok(())
        })
    }

    async fn upsert_template(&self, name: &str, body: &Value) -> Result<()> {
        self.with_state(|s| -> Result<()> {
            s.calls.push(Call::UpsertTemplate(name.to_string()));
            if s.failing_template.as_deref() == Some(name) {
                return Err(Error::EngineWrite {
                    operation: format!("upsert template '{}'", name),
                    status: 500,
                    body: "{\"error\":\"scripted\"}".to_string(),
                });
            }
            s.templates.insert(name.to_string(), body.clone());
            Ok(())
        })
    }
}
