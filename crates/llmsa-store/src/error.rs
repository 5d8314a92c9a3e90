//! Error types for bundle storage.

/// Errors from local and OCI bundle storage.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O failure, annotated with what was being done.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// An OCI reference could not be parsed.
    #[error("parse oci ref {reference:?}: {detail}")]
    InvalidReference { reference: String, detail: String },

    /// A registry operation failed.
    #[error("{context}: {detail}")]
    Registry { context: String, detail: String },

    /// The pulled artifact does not carry a bundle layer.
    #[error("oci artifact has no layers")]
    EmptyArtifact,
}

impl StoreError {
    /// Wrap an I/O error with a short description of the operation.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
