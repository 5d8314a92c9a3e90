//! Bundle storage: a local attestation directory and OCI push/pull of
//! single-layer artifacts.

pub mod error;
pub mod local;
pub mod oci;

pub use error::StoreError;
