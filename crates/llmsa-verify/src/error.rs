//! Error types for the verification subsystem.

use llmsa_core::CoreError;

/// Errors from verification checks and policy evaluation.
///
/// Check failures are recorded in the report via their `Display` form;
/// they never abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// I/O failure, annotated with what was being done.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure (policy documents).
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Failure from the statement and bundle layer.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Signature check failure.
    #[error("{0}")]
    Signature(String),

    /// Schema check failure.
    #[error("{0}")]
    Schema(String),

    /// Local chain-constraint failure.
    #[error("{0}")]
    Chain(String),

    /// Subject digest check failure.
    #[error("{0}")]
    Subject(String),
}

impl VerifyError {
    /// Wrap an I/O error with a short description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
