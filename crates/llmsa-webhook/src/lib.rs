//! Kubernetes validating admission webhook.
//!
//! For every container image in an admitted workload, the handler derives
//! the attestation artifact reference, pulls the bundle from the
//! registry, and runs the verification engine. A TTL cache remembers
//! successful verifications and a keyed singleflight collapses concurrent
//! pulls of the same reference.

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod flight;
pub mod handler;
pub mod review;
pub mod server;

pub use error::WebhookError;
