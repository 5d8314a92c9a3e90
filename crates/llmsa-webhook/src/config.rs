//! Webhook server configuration.

use std::path::PathBuf;

/// Settings for the admission webhook server.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Listen port.
    pub port: u16,
    /// TLS certificate path; plain HTTP when empty.
    pub tls_cert_path: Option<PathBuf>,
    /// TLS private key path.
    pub tls_key_path: Option<PathBuf>,
    /// Policy YAML path (reserved for gate-aware deployments).
    pub policy_path: Option<PathBuf>,
    /// Schema directory for the verification engine.
    pub schema_dir: PathBuf,
    /// OCI registry prefix holding attestation artifacts.
    pub registry_prefix: String,
    /// Allow workloads when verification infrastructure fails.
    pub fail_open: bool,
    /// Success-cache TTL in seconds; 0 or negative disables the cache.
    pub cache_ttl_seconds: i64,
    /// Deadline for one image's pull+verify, in seconds.
    pub verify_timeout_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        WebhookConfig {
            port: 8443,
            tls_cert_path: None,
            tls_key_path: None,
            policy_path: None,
            schema_dir: PathBuf::from("schemas/v1"),
            registry_prefix: String::new(),
            fail_open: false,
            cache_ttl_seconds: 300,
            verify_timeout_seconds: 30,
        }
    }
}
