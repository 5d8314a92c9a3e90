//! Error types for the collector subsystem.

use llmsa_core::CoreError;

/// Errors from collectors and the attestation service.
#[derive(Debug, thiserror::Error)]
pub enum AttestError {
    /// A config file could not be read.
    #[error("read config {path}: {source}")]
    ReadConfig {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A config file could not be parsed as YAML.
    #[error("parse config {path}: {source}")]
    ParseConfig {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required config field is missing or empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A required path is missing or unreadable.
    #[error("{name} path {path}: {source}")]
    MissingPath {
        name: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The requested attestation type is not one of the five kinds.
    #[error("unsupported attestation type: {0}")]
    UnsupportedType(String),

    /// The configured privacy mode is not recognized.
    #[error("unsupported privacy_mode {0:?}")]
    UnsupportedPrivacyMode(String),

    /// The encrypted-payload recipient could not be parsed.
    #[error("parse age_recipient: {0}")]
    InvalidRecipient(String),

    /// Re-collection produced a different canonical hash.
    #[error("determinism check failed: {first} != {next}")]
    Determinism { first: String, next: String },

    /// Invalid invocation (missing arguments, no matching rules).
    #[error("{0}")]
    Invalid(String),

    /// I/O failure, annotated with what was being done.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Failure from the statement and bundle layer.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AttestError {
    /// Wrap an I/O error with a short description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
