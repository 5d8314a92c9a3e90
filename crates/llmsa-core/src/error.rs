//! Error types for the statement and bundle layer.

/// Errors from canonicalization, digesting, signing, and bundle handling.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure, annotated with what was being done.
    #[error("{context}: {source}")]
    Io {
        /// What was being read or written.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Canonical JSON rejected a numeric token (NaN, infinity, overflow).
    #[error("invalid number {0:?} in canonical JSON")]
    InvalidNumber(String),

    /// Key loading, parsing, or generation failed.
    #[error("key error: {0}")]
    Key(String),

    /// A signing operation failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The requested signing provider is not available.
    #[error("unsupported signing provider: {0}")]
    UnsupportedProvider(String),

    /// Schema loading or compilation failed.
    #[error("schema error: {0}")]
    Schema(String),

    /// A bundle is structurally invalid.
    #[error("invalid bundle: {0}")]
    InvalidBundle(String),
}

impl CoreError {
    /// Wrap an I/O error with a short description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
