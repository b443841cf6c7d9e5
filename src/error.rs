//! Custom error types for index-provisioner

use crate::schema::Diff;
use std::time::Duration;
use thiserror::Error;

/// Main error type for provisioning operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Network-level failure that outlived the HTTP retry policy
    #[error("{operation} failed after {attempts} attempt(s): {message}")]
    Transient {
        operation: String,
        attempts: u32,
        message: String,
    },

    #[error("Search engine not ready after {}s", .elapsed.as_secs())]
    ReadinessTimeout { elapsed: Duration },

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Index already exists: {0}")]
    IndexAlreadyExists(String),

    #[error("{operation} returned unexpected status {status}: {body}")]
    UnexpectedResponse {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Index '{index}' exists but its mapping has drifted: {diff}. Rerun with --force-recreate after stopping writers.")]
    SchemaDrift { index: String, diff: Diff },

    #[error("{operation} failed with status {status}: {body}")]
    EngineWrite {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("Index '{index}' failed validation after provisioning: {diff}")]
    PostValidation { index: String, diff: Diff },

    #[error("Template '{name}' failed: {source}")]
    Template {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether a retry loop may absorb this error
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Transient { .. } => true,
            Error::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Error::UnexpectedResponse { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Process exit status for a fatal error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::TomlParse(_) | Error::UrlParse(_) => 2,
            Error::ReadinessTimeout { .. } => 3,
            Error::SchemaDrift { .. } => 4,
            Error::EngineWrite { .. } => 5,
            Error::PostValidation { .. } => 6,
            Error::Template { .. } => 7,
            _ => 1,
        }
    }
}

/// Result type alias for index-provisioner
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldMismatch;

    #[test]
    fn test_exit_codes_are_distinct_per_fatal_class() {
        let diff = Diff::from(vec![FieldMismatch {
            path: "address_parts".to_string(),
            expected: "nested".to_string(),
            observed: Some("object".to_string()),
        }]);

        let errors = [
            Error::Config("bad".to_string()),
            Error::ReadinessTimeout {
                elapsed: Duration::from_secs(300),
            },
            Error::SchemaDrift {
                index: "idx".to_string(),
                diff: diff.clone(),
            },
            Error::EngineWrite {
                operation: "create index".to_string(),
                status: 400,
                body: "{}".to_string(),
            },
            Error::PostValidation {
                index: "idx".to_string(),
                diff,
            },
        ];

        let codes: Vec<i32> = errors.iter().map(Error::exit_code).collect();
        assert_eq!(codes, vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_drift_message_includes_diff() {
        let err = Error::SchemaDrift {
            index: "address_places".to_string(),
            diff: Diff::from(vec![FieldMismatch {
                path: "address_parts".to_string(),
                expected: "nested".to_string(),
                observed: Some("object".to_string()),
            }]),
        };

        let message = err.to_string();
        assert!(message.contains("address_parts expected nested, got object"));
        assert!(message.contains("--force-recreate"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::UnexpectedResponse {
            operation: "health".to_string(),
            status: 503,
            body: String::new(),
        }
        .is_transient());
        assert!(!Error::IndexNotFound("idx".to_string()).is_transient());
    }
}
