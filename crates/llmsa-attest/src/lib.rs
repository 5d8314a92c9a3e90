//! Statement collectors and attestation orchestration.
//!
//! Each attestation kind has a collector that reads a declarative YAML
//! config, digests the referenced artifacts, and produces a typed
//! [`llmsa_core::statement::Statement`]. The service layer adds privacy
//! post-processing, a determinism self-check, and changed-paths-to-kinds
//! orchestration.

pub mod collect;
pub mod config;
pub mod error;
pub mod privacy;
pub mod service;
pub mod statement;
pub mod vcs;

pub use error::AttestError;
