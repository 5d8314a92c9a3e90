//! Error types for the admission webhook.

/// Errors from the admission webhook.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The request body could not be read or decoded.
    #[error("{0}")]
    BadRequest(String),

    /// The admitted resource kind is not supported.
    #[error("unsupported resource kind")]
    UnsupportedKind,

    /// An attestation reference could not be derived.
    #[error("{0}")]
    InvalidReference(String),

    /// Pulling or verifying an image's attestation failed.
    #[error("{0}")]
    Verification(String),

    /// I/O failure, annotated with what was being done.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Server setup failure (bind, TLS configuration).
    #[error("{0}")]
    Server(String),
}

impl WebhookError {
    /// Wrap an I/O error with a short description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
