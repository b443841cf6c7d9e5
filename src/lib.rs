//! index-provisioner: keep a search index schema and its query templates in sync
//!
//! Control flow of a full run: readiness gate, index reconciliation, template
//! upsert, final validation. The engine is the only source of truth for
//! current state; desired state lives in code.

pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod readiness;
pub mod reconcile;
pub mod schema;
pub mod templates;
