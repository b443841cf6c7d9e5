//! Drift detection between a desired schema and a live index.
//!
//! Only the declared fingerprint fields are compared. New optional fields in
//! either mapping never count as drift.

use super::{LiveIndexState, SchemaDescriptor};
use serde::Serialize;
use std::fmt;

/// One fingerprint field whose live type differs from the desired one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMismatch {
    pub path: String,
    pub expected: String,
    /// `None` when the field is missing from the live mapping
    pub observed: Option<String>,
}

impl fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} expected {}, got {}",
            self.path,
            self.expected,
            self.observed.as_deref().unwrap_or("<missing>")
        )
    }
}

/// Ordered list of mismatches, in fingerprint declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diff(Vec<FieldMismatch>);

impl Diff {
    /// Every fingerprint field reported as missing
    pub fn all_missing(desired: &SchemaDescriptor) -> Self {
        Self(
            desired
                .fingerprint()
                .iter()
                .map(|field| FieldMismatch {
                    path: field.path.clone(),
                    expected: field.expected_type.clone(),
                    observed: None,
                })
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn entries(&self) -> &[FieldMismatch] {
        &self.0
    }
}

impl From<Vec<FieldMismatch>> for Diff {
    fn from(entries: Vec<FieldMismatch>) -> Self {
        Self(entries)
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no differences");
        }
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Result of comparing desired and observed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    /// The index does not exist; resolved by plain creation
    Absent,
    /// The index exists; an empty diff means compatible
    Present(Diff),
}

impl Comparison {
    pub fn is_compatible(&self) -> bool {
        matches!(self, Comparison::Present(diff) if diff.is_empty())
    }

    /// The diff to report, treating an absent index as every field missing
    pub fn into_diff(self, desired: &SchemaDescriptor) -> Diff {
        match self {
            Comparison::Absent => Diff::all_missing(desired),
            Comparison::Present(diff) => diff,
        }
    }
}

/// Compare the live fingerprint against the desired one. Pure and deterministic.
pub fn compare(desired: &SchemaDescriptor, observed: &LiveIndexState) -> Comparison {
    if !observed.exists {
        return Comparison::Absent;
    }

    let mismatches = desired
        .fingerprint()
        .iter()
        .filter_map(|field| {
            let live = observed.fingerprint.get(&field.path);
            if live.map(String::as_str) == Some(field.expected_type.as_str()) {
                return None;
            }
            Some(FieldMismatch {
                path: field.path.clone(),
                expected: field.expected_type.clone(),
                observed: live.cloned(),
            })
        })
        .collect();

    Comparison::Present(Diff(mismatches))
}
