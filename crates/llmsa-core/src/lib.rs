//! Canonical statements, content digests, and signed bundles.
//!
//! `llmsa-core` is the leaf crate of the attestation pipeline. It defines
//! the typed statement model, the canonical JSON serialization that all
//! content addressing is computed over, file and directory-tree digests,
//! the signed envelope/bundle wire format, and the signing providers.

pub mod bundle;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod pathmatch;
pub mod schema;
pub mod signer;
pub mod statement;

pub use error::CoreError;
