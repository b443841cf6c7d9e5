//! Desired index schemas
//!
//! A [`SchemaDescriptor`] is the complete, immutable desired state of one
//! index: settings, mapping, and the fingerprint fields whose types decide
//! whether a live index is compatible.

mod address_places;
mod compare;

pub use address_places::*;
pub use compare::*;

use crate::engine::Fingerprint;
use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};

/// A field whose type must match for the live index to be compatible
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintField {
    pub path: String,
    pub expected_type: String,
}

/// Desired state of one index at one schema version
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    index_name: String,
    version: String,
    settings: Value,
    mapping: Value,
    fingerprint: Vec<FingerprintField>,
}

impl SchemaDescriptor {
    /// Build a descriptor; every fingerprint path must resolve in `mapping`,
    /// and the type it resolves to becomes the expected type.
    pub fn new<S: AsRef<str>>(
        index_name: impl Into<String>,
        version: impl Into<String>,
        settings: Value,
        mapping: Value,
        fingerprint_paths: &[S],
    ) -> Result<Self> {
        let index_name = index_name.into();
        if fingerprint_paths.is_empty() {
            return Err(Error::Config(format!(
                "Schema for '{}' declares no fingerprint fields",
                index_name
            )));
        }

        let fingerprint = fingerprint_paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                let expected_type = field_type(&mapping, path).ok_or_else(|| {
                    Error::Config(format!(
                        "Fingerprint field '{}' is not declared in the mapping of '{}'",
                        path, index_name
                    ))
                })?;
                Ok(FingerprintField {
                    path: path.to_string(),
                    expected_type: expected_type.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            index_name,
            version: version.into(),
            settings,
            mapping,
            fingerprint,
        })
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn settings(&self) -> &Value {
        &self.settings
    }

    pub fn mapping(&self) -> &Value {
        &self.mapping
    }

    pub fn fingerprint(&self) -> &[FingerprintField] {
        &self.fingerprint
    }

    pub fn fingerprint_paths(&self) -> Vec<&str> {
        self.fingerprint.iter().map(|f| f.path.as_str()).collect()
    }

    /// Body of a create-index request
    pub fn create_body(&self) -> Value {
        create_index_body(&self.settings, &self.mapping)
    }
}

/// Live state of an index, observed once per reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveIndexState {
    pub exists: bool,
    pub fingerprint: Fingerprint,
}

impl LiveIndexState {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(fingerprint: Fingerprint) -> Self {
        Self {
            exists: true,
            fingerprint,
        }
    }
}

/// `PUT /{index}` payload for the given settings and mapping
pub fn create_index_body(settings: &Value, mapping: &Value) -> Value {
    json!({
        "settings": settings,
        "mappings": mapping,
    })
}

/// Resolve the type of a dotted field path inside a mapping (`{"properties": ...}`).
///
/// Object fields carry no explicit `type` in engine responses; a node with
/// sub-properties and no type resolves to `object`.
pub fn field_type<'a>(mapping: &'a Value, path: &str) -> Option<&'a str> {
    let mut node = mapping;
    for segment in path.split('.') {
        node = node.get("properties")?.get(segment)?;
    }

    match node.get("type").and_then(Value::as_str) {
        Some(kind) => Some(kind),
        None if node.get("properties").is_some() => Some("object"),
        None => None,
    }
}
