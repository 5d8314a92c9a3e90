//! The admission handler.
//!
//! Per image: derive the attestation reference, consult the success
//! cache, coalesce concurrent work per reference, pull the bundle into a
//! fresh scratch directory, and run the verification engine. Failures
//! are aggregated across all containers so operators see a complete
//! report; `fail_open` decides what infrastructure errors mean.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use llmsa_store::StoreError;
use llmsa_verify::engine::{run, Options};
use llmsa_verify::signature::SignerPolicy;

use crate::cache::VerifierCache;
use crate::config::WebhookConfig;
use crate::extract::{attestation_ref, extract_image_refs, ImageRef};
use crate::flight::FlightGroup;
use crate::review::{pod_spec_from_resource, AdmissionReview};

/// Maximum accepted request body size (10 MiB).
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Capability for fetching attestation bundles, so tests can inject an
/// in-memory double for the registry.
#[allow(async_fn_in_trait)]
pub trait BundlePuller: Send + Sync {
    /// Fetch the bundle at `oci_ref` into `out_path`.
    async fn pull(&self, oci_ref: &str, out_path: &Path) -> Result<(), StoreError>;
}

/// The production puller backed by the OCI store.
pub struct OciBundlePuller;

impl BundlePuller for OciBundlePuller {
    async fn pull(&self, oci_ref: &str, out_path: &Path) -> Result<(), StoreError> {
        llmsa_store::oci::pull(oci_ref, out_path).await
    }
}

/// What the server should send back for one admission request.
#[derive(Debug)]
pub enum HandlerOutcome {
    /// A well-formed AdmissionReview response.
    Review(AdmissionReview),
    /// HTTP 400 with this message.
    BadRequest(String),
}

/// The admission handler with its shared verification state.
pub struct AdmissionHandler<P> {
    cfg: WebhookConfig,
    cache: VerifierCache,
    flights: Arc<FlightGroup>,
    puller: P,
}

impl AdmissionHandler<OciBundlePuller> {
    /// Create a handler pulling from the real registry.
    pub fn new(cfg: WebhookConfig) -> Self {
        Self::with_puller(cfg, OciBundlePuller)
    }
}

impl<P: BundlePuller> AdmissionHandler<P> {
    /// Create a handler with a custom puller (tests).
    pub fn with_puller(cfg: WebhookConfig, puller: P) -> Self {
        let cache = VerifierCache::new(cfg.cache_ttl_seconds);
        AdmissionHandler {
            cfg,
            cache,
            flights: FlightGroup::new(),
            puller,
        }
    }

    /// Process one admission request body.
    pub async fn handle(&self, body: &[u8]) -> HandlerOutcome {
        let review: AdmissionReview = match serde_json::from_slice(body) {
            Ok(r) => r,
            Err(e) => {
                return self.error_outcome("", &format!("decode admission review: {e}"));
            }
        };
        let Some(request) = review.request else {
            return self.error_outcome("", "admission review has no request");
        };

        let spec = match pod_spec_from_resource(&request.object) {
            Ok(spec) => spec,
            Err(e) => {
                return self.error_outcome(&request.uid, &format!("extract pod spec: {e}"));
            }
        };

        let refs = extract_image_refs(&spec);
        let mut violations = Vec::new();
        for image in &refs {
            if let Err(reason) = self.verify_image(image).await {
                violations.push(format!(
                    "container {:?} ({}): {reason}",
                    image.container, image.image
                ));
            }
        }

        if !violations.is_empty() && !self.cfg.fail_open {
            tracing::info!(uid = %request.uid, count = violations.len(), "denying admission");
            return HandlerOutcome::Review(AdmissionReview::response(
                &request.uid,
                false,
                &format!("attestation verification failed: {}", violations.join("; ")),
            ));
        }
        HandlerOutcome::Review(AdmissionReview::response(
            &request.uid,
            true,
            "all attestations verified",
        ))
    }

    /// Verify one image's attestation, going through cache and
    /// singleflight.
    async fn verify_image(&self, image: &ImageRef) -> Result<(), String> {
        let oci_ref = attestation_ref(&self.cfg.registry_prefix, &image.image)
            .map_err(|e| format!("construct attestation ref: {e}"))?;

        if self.cache.has_fresh(&oci_ref, Instant::now()) {
            return Ok(());
        }

        let deadline = Duration::from_secs(self.cfg.verify_timeout_seconds);
        let flight = self.flights.run(&oci_ref, || async {
            // Re-check in case a previous holder just populated the cache.
            if self.cache.has_fresh(&oci_ref, Instant::now()) {
                return Ok(());
            }
            self.verify_image_no_cache(&oci_ref).await?;
            self.cache.put_success(&oci_ref, Instant::now());
            Ok(())
        });
        match tokio::time::timeout(deadline, flight).await {
            Ok(result) => result,
            Err(_) => Err("verification deadline exceeded".to_owned()),
        }
    }

    /// Pull into a fresh scratch directory and run the engine.
    async fn verify_image_no_cache(&self, oci_ref: &str) -> Result<(), String> {
        let tmp = tempfile::tempdir().map_err(|e| format!("create temp dir: {e}"))?;
        let out_path = tmp.path().join("bundle.bundle.json");
        self.puller
            .pull(oci_ref, &out_path)
            .await
            .map_err(|e| format!("pull attestation bundle: {e}"))?;

        let opts = Options {
            source_path: tmp.path().to_path_buf(),
            schema_dir: self.cfg.schema_dir.clone(),
            signer_policy: SignerPolicy::default(),
        };
        let report = tokio::task::spawn_blocking(move || run(&opts))
            .await
            .map_err(|e| format!("verification task failed: {e}"))?;
        if !report.passed {
            return Err(format!(
                "exit {}: {}",
                report.exit_code,
                report.violations.join("; ")
            ));
        }
        Ok(())
    }

    /// Map an infrastructure error through the fail-open policy.
    fn error_outcome(&self, uid: &str, message: &str) -> HandlerOutcome {
        if self.cfg.fail_open {
            tracing::warn!(uid = %uid, message, "allowing admission (fail-open)");
            return HandlerOutcome::Review(AdmissionReview::response(
                uid,
                true,
                &format!("fail-open: {message}"),
            ));
        }
        HandlerOutcome::BadRequest(message.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use llmsa_core::bundle::{create_bundle, Bundle};
    use llmsa_core::canonical::{bare_hex, canonical_json, digest_bytes};
    use llmsa_core::signer::{generate_pem_private_key, PemSigner};

    fn schema_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../schemas/v1")
    }

    /// A puller serving fixed bundle bytes and counting invocations.
    struct FakePuller {
        bundle_json: Vec<u8>,
        pulls: AtomicUsize,
        delay: Duration,
        fail_with: Option<String>,
    }

    impl FakePuller {
        fn serving(bundle: &Bundle) -> Self {
            FakePuller {
                bundle_json: serde_json::to_vec_pretty(bundle).expect("serialize"),
                pulls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail_with: None,
            }
        }

        fn failing(message: &str) -> Self {
            FakePuller {
                bundle_json: Vec::new(),
                pulls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail_with: Some(message.to_owned()),
            }
        }

        fn pull_count(&self) -> usize {
            self.pulls.load(Ordering::SeqCst)
        }
    }

    impl BundlePuller for FakePuller {
        async fn pull(&self, _oci_ref: &str, out_path: &Path) -> Result<(), StoreError> {
            self.pulls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if let Some(ref message) = self.fail_with {
                return Err(StoreError::Registry {
                    context: "pull oci artifact".to_owned(),
                    detail: message.clone(),
                });
            }
            std::fs::write(out_path, &self.bundle_json)
                .map_err(|e| StoreError::io("write fake bundle", e))
        }
    }

    /// Keep subject fixtures alive for the duration of a test.
    static FIXTURES: Mutex<Vec<tempfile::TempDir>> = Mutex::new(Vec::new());

    fn valid_bundle() -> Bundle {
        let tmp = tempfile::tempdir().expect("tempdir");
        let subject_path = tmp.path().join("artifact.txt");
        std::fs::write(&subject_path, b"artifact-bytes").expect("write");
        let key = tmp.path().join("key.pem");
        generate_pem_private_key(&key).expect("generate");
        let signer = PemSigner::from_file(&key).expect("load");

        let statement = serde_json::json!({
            "schema_version": "1.0.0",
            "statement_id": "11111111-2222-3333-4444-555555555555",
            "attestation_type": "slo_attestation",
            "predicate_type": "https://llmsa.dev/attestation/slo/v1",
            "generated_at": "2025-07-01T00:00:00Z",
            "generator": { "name": "llmsa", "version": "0.1.0", "git_sha": "local" },
            "subject": [{
                "name": "artifact.txt",
                "uri": subject_path.to_str().unwrap(),
                "digest": { "sha256": bare_hex(&digest_bytes(b"artifact-bytes")) },
                "size_bytes": 14
            }],
            "predicate": {
                "slo_profile_id": "p",
                "window": { "start": "2025-07-01T00:00:00Z", "end": "2025-07-02T00:00:00Z" },
                "ttft_ms_p50": 100.0,
                "ttft_ms_p95": 200.0,
                "tokens_per_sec_p50": 40.0,
                "cost_per_1k_tokens_cap_usd": 0.02,
                "error_rate_cap": 0.01,
                "error_budget_remaining": 0.9
            },
            "privacy": { "mode": "hash_only" }
        });
        let canonical = canonical_json(&statement).expect("canonical");
        let material = signer.sign(&canonical).expect("sign");
        let bundle = create_bundle(&statement, material).expect("bundle");

        FIXTURES.lock().expect("fixtures").push(tmp);
        bundle
    }

    fn admission_body(image: &str) -> Vec<u8> {
        serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "uid-1",
                "object": {
                    "kind": "Pod",
                    "spec": { "containers": [{ "name": "app", "image": image }] }
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    fn config() -> WebhookConfig {
        WebhookConfig {
            registry_prefix: "ghcr.io/org/att".to_owned(),
            schema_dir: schema_dir(),
            cache_ttl_seconds: 60,
            ..WebhookConfig::default()
        }
    }

    fn assert_allowed(outcome: &HandlerOutcome, expect: bool) {
        match outcome {
            HandlerOutcome::Review(review) => {
                let response = review.response.as_ref().expect("response");
                assert_eq!(response.allowed, expect, "{response:?}");
            }
            HandlerOutcome::BadRequest(m) => panic!("unexpected 400: {m}"),
        }
    }

    #[tokio::test]
    async fn valid_bundle_allows_admission() {
        let handler = AdmissionHandler::with_puller(config(), FakePuller::serving(&valid_bundle()));
        let outcome = handler.handle(&admission_body("myapp@sha256:abc123")).await;
        assert_allowed(&outcome, true);
        assert_eq!(handler.puller.pull_count(), 1);
    }

    #[tokio::test]
    async fn warm_cache_skips_the_pull() {
        let handler = AdmissionHandler::with_puller(config(), FakePuller::serving(&valid_bundle()));
        let body = admission_body("myapp@sha256:abc123");

        assert_allowed(&handler.handle(&body).await, true);
        assert_allowed(&handler.handle(&body).await, true);
        assert_eq!(handler.puller.pull_count(), 1, "second admission must hit the cache");
    }

    #[tokio::test]
    async fn concurrent_admissions_coalesce_to_one_pull() {
        let mut puller = FakePuller::serving(&valid_bundle());
        puller.delay = Duration::from_millis(50);
        let handler = Arc::new(AdmissionHandler::with_puller(config(), puller));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let handler = Arc::clone(&handler);
            handles.push(tokio::spawn(async move {
                handler.handle(&admission_body("myapp@sha256:abc123")).await
            }));
        }
        for handle in handles {
            assert_allowed(&handle.await.expect("join"), true);
        }
        assert_eq!(handler.puller.pull_count(), 1);
    }

    #[tokio::test]
    async fn failed_verification_is_not_cached() {
        let handler =
            AdmissionHandler::with_puller(config(), FakePuller::failing("registry said no"));
        let body = admission_body("myapp@sha256:abc123");

        assert_allowed(&handler.handle(&body).await, false);
        assert_allowed(&handler.handle(&body).await, false);
        assert_eq!(handler.puller.pull_count(), 2, "failures must re-verify");
    }

    #[tokio::test]
    async fn denial_message_names_container_and_image() {
        let handler =
            AdmissionHandler::with_puller(config(), FakePuller::failing("registry said no"));
        let outcome = handler.handle(&admission_body("myapp@sha256:abc123")).await;
        let HandlerOutcome::Review(review) = outcome else {
            panic!("expected review");
        };
        let message = review.response.unwrap().status.unwrap().message;
        assert!(message.contains("attestation verification failed"));
        assert!(message.contains("container \"app\" (myapp@sha256:abc123)"));
        assert!(message.contains("registry said no"));
    }

    #[tokio::test]
    async fn fail_open_allows_on_pull_failure() {
        let mut cfg = config();
        cfg.fail_open = true;
        let handler =
            AdmissionHandler::with_puller(cfg, FakePuller::failing("registry said no"));
        let outcome = handler.handle(&admission_body("myapp@sha256:abc123")).await;
        assert_allowed(&outcome, true);
    }

    #[tokio::test]
    async fn unsupported_kind_is_bad_request_when_fail_closed() {
        let handler = AdmissionHandler::with_puller(config(), FakePuller::failing("unused"));
        let body = serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": { "uid": "uid-1", "object": { "kind": "ConfigMap" } }
        })
        .to_string()
        .into_bytes();

        match handler.handle(&body).await {
            HandlerOutcome::BadRequest(m) => assert!(m.contains("unsupported resource kind")),
            HandlerOutcome::Review(r) => panic!("expected 400, got {r:?}"),
        }
    }

    #[tokio::test]
    async fn unsupported_kind_allows_when_fail_open() {
        let mut cfg = config();
        cfg.fail_open = true;
        let handler = AdmissionHandler::with_puller(cfg, FakePuller::failing("unused"));
        let body = serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": { "uid": "uid-1", "object": { "kind": "ConfigMap" } }
        })
        .to_string()
        .into_bytes();

        let outcome = handler.handle(&body).await;
        let HandlerOutcome::Review(review) = outcome else {
            panic!("expected review");
        };
        let response = review.response.unwrap();
        assert!(response.allowed);
        assert!(response.status.unwrap().message.starts_with("fail-open:"));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let handler = AdmissionHandler::with_puller(config(), FakePuller::failing("unused"));
        match handler.handle(b"not json").await {
            HandlerOutcome::BadRequest(m) => assert!(m.contains("decode admission review")),
            HandlerOutcome::Review(r) => panic!("expected 400, got {r:?}"),
        }
    }

    #[tokio::test]
    async fn all_violations_are_aggregated() {
        let handler =
            AdmissionHandler::with_puller(config(), FakePuller::failing("registry said no"));
        let body = serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "uid-1",
                "object": {
                    "kind": "Pod",
                    "spec": { "containers": [
                        { "name": "app", "image": "a@sha256:1111" },
                        { "name": "sidecar", "image": "b@sha256:2222" }
                    ] }
                }
            }
        })
        .to_string()
        .into_bytes();

        let HandlerOutcome::Review(review) = handler.handle(&body).await else {
            panic!("expected review");
        };
        let message = review.response.unwrap().status.unwrap().message;
        // An early failure does not short-circuit later images.
        assert!(message.contains("container \"app\""));
        assert!(message.contains("container \"sidecar\""));
        assert_eq!(handler.puller.pull_count(), 2);
    }
}
