//! The typed attestation statement model.
//!
//! A statement is immutable after construction: it is canonicalized,
//! hashed, signed, and embedded in a bundle, and its bytes never change
//! afterwards. Predicates are a closed set — one record per attestation
//! kind, selected by the `attestation_type` discriminator.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Statement schema version stamped into every statement.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// The closed set of attestation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttestationKind {
    /// Prompt bundle provenance.
    #[serde(rename = "prompt_attestation")]
    Prompt,
    /// Knowledge-corpus snapshot provenance.
    #[serde(rename = "corpus_attestation")]
    Corpus,
    /// Eval-run provenance.
    #[serde(rename = "eval_attestation")]
    Eval,
    /// Routing-configuration provenance.
    #[serde(rename = "route_attestation")]
    Route,
    /// SLO-profile provenance.
    #[serde(rename = "slo_attestation")]
    Slo,
}

impl AttestationKind {
    /// All kinds, in chain order.
    pub const ALL: [AttestationKind; 5] = [
        AttestationKind::Prompt,
        AttestationKind::Corpus,
        AttestationKind::Eval,
        AttestationKind::Route,
        AttestationKind::Slo,
    ];

    /// The wire string for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            AttestationKind::Prompt => "prompt_attestation",
            AttestationKind::Corpus => "corpus_attestation",
            AttestationKind::Eval => "eval_attestation",
            AttestationKind::Route => "route_attestation",
            AttestationKind::Slo => "slo_attestation",
        }
    }

    /// Parse a wire string into a kind.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw)
    }

    /// The predicate type URI determined by this kind.
    pub fn predicate_uri(self) -> &'static str {
        match self {
            AttestationKind::Prompt => "https://llmsa.dev/attestation/prompt/v1",
            AttestationKind::Corpus => "https://llmsa.dev/attestation/corpus/v1",
            AttestationKind::Eval => "https://llmsa.dev/attestation/eval/v1",
            AttestationKind::Route => "https://llmsa.dev/attestation/route/v1",
            AttestationKind::Slo => "https://llmsa.dev/attestation/slo/v1",
        }
    }

    /// The kinds that must have been produced before this one.
    pub fn required_predecessors(self) -> &'static [AttestationKind] {
        match self {
            AttestationKind::Prompt | AttestationKind::Corpus => &[],
            AttestationKind::Eval => &[AttestationKind::Prompt, AttestationKind::Corpus],
            AttestationKind::Route => &[AttestationKind::Eval],
            AttestationKind::Slo => &[AttestationKind::Route],
        }
    }
}

impl fmt::Display for AttestationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kinds required before a given wire-string kind; empty for unknown
/// or predecessor-free kinds.
pub fn required_predecessors(attestation_type: &str) -> &'static [AttestationKind] {
    AttestationKind::parse(attestation_type)
        .map(AttestationKind::required_predecessors)
        .unwrap_or(&[])
}

/// A typed provenance statement.
#[derive(Debug, Clone, Serialize)]
pub struct Statement {
    /// Always [`SCHEMA_VERSION`].
    pub schema_version: String,
    /// Unique random id for this statement.
    pub statement_id: String,
    /// Kind discriminator; determines the predicate shape.
    pub attestation_type: AttestationKind,
    /// Predicate type URI, determined by the kind.
    pub predicate_type: String,
    /// RFC3339 UTC creation time.
    pub generated_at: String,
    /// The producing toolchain.
    pub generator: Generator,
    /// Artifacts this statement commits to.
    pub subject: Vec<Subject>,
    /// Inputs not authored here.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<Subject>,
    /// The kind-specific predicate record.
    pub predicate: Predicate,
    /// Privacy classification for this statement.
    pub privacy: Privacy,
    /// Small free-form map; `depends_on` carries the canonicalized
    /// dependency list.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Identifies the toolchain that produced a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    /// Tool name.
    pub name: String,
    /// Tool version.
    pub version: String,
    /// Git commit of the producing checkout.
    pub git_sha: String,
}

/// A file or directory the statement commits to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Artifact name.
    pub name: String,
    /// Path the digest was computed from.
    pub uri: String,
    /// Content digest.
    pub digest: SubjectDigest,
    /// File size; 0 for directories.
    pub size_bytes: u64,
}

/// Bare-hex digest carried on a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectDigest {
    /// Lowercase hex SHA-256 without the `sha256:` prefix.
    pub sha256: String,
}

/// Privacy classification of a statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Privacy {
    /// The privacy mode.
    pub mode: PrivacyMode,
    /// Digest binding the encrypted payload, `encrypted_payload` mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_blob_digest: Option<String>,
    /// Fingerprint of the encryption recipient, `encrypted_payload` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_recipient_fingerprint: Option<String>,
}

impl Privacy {
    /// The default metadata-only privacy classification.
    pub fn hash_only() -> Self {
        Privacy {
            mode: PrivacyMode::HashOnly,
            encrypted_blob_digest: None,
            encryption_recipient_fingerprint: None,
        }
    }
}

/// How much of a statement's source content may be exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivacyMode {
    /// Only digests are emitted (the default).
    #[serde(rename = "hash_only")]
    HashOnly,
    /// Plaintext exposure was explicitly requested; the policy gate
    /// blocks it unless the statement id is allowlisted.
    #[serde(rename = "plaintext_explicit")]
    PlaintextExplicit,
    /// Only metadata of an externally encrypted payload is carried.
    #[serde(rename = "encrypted_payload")]
    EncryptedPayload,
}

/// The kind-specific predicate record.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Predicate {
    /// Prompt bundle predicate.
    Prompt(PromptPredicate),
    /// Corpus snapshot predicate.
    Corpus(CorpusPredicate),
    /// Eval run predicate.
    Eval(EvalPredicate),
    /// Routing configuration predicate.
    Route(RoutePredicate),
    /// SLO profile predicate.
    Slo(SloPredicate),
}

/// Prompt bundle provenance.
#[derive(Debug, Clone, Serialize)]
pub struct PromptPredicate {
    /// Order-independent summary digest over the prompt inputs.
    pub prompt_bundle_digest: String,
    pub system_prompt_digest: String,
    /// Sorted digests of every template file.
    pub template_digests: Vec<String>,
    /// Sorted digests of every tool schema file.
    pub tool_schema_digests: Vec<String>,
    pub safety_policy_digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_render_config_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_test_suite_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sensitivity_labels: Vec<String>,
}

/// A named digest, used for connector configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedDigest {
    pub name: String,
    pub digest: String,
}

/// Corpus snapshot provenance.
#[derive(Debug, Clone, Serialize)]
pub struct CorpusPredicate {
    pub corpus_snapshot_id: String,
    pub connector_config_digests: Vec<NamedDigest>,
    pub document_manifest_digest: String,
    pub chunking_config_digest: String,
    pub embedding_model: String,
    pub embedding_input_digest: String,
    pub index_builder_image_digest: String,
    pub vector_index_digest: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_command_digest: Option<String>,
}

/// Eval run provenance.
#[derive(Debug, Clone, Serialize)]
pub struct EvalPredicate {
    pub eval_suite_id: String,
    pub testset_digest: String,
    pub scoring_config_digest: String,
    pub baseline_result_digest: String,
    pub candidate_result_digest: String,
    /// Metric name to observed value.
    pub metrics: BTreeMap<String, f64>,
    /// `<name>_min` / `<name>_max` threshold map.
    pub thresholds: BTreeMap<String, f64>,
    /// Derived: whether any threshold was violated.
    pub regression_detected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_environment_digest: Option<String>,
}

/// One provider/model pair in a routing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderModel {
    pub provider: String,
    pub model: String,
}

/// Routing configuration provenance.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePredicate {
    pub route_config_digest: String,
    /// Non-empty set of provider/model pairs.
    pub provider_set: Vec<ProviderModel>,
    pub budget_policy_digest: String,
    pub fallback_graph_digest: String,
    /// Non-empty strategy name.
    pub routing_strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canary_config_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_result_digest: Option<String>,
}

/// An RFC3339 observation window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String,
    pub end: String,
}

/// SLO profile provenance.
#[derive(Debug, Clone, Serialize)]
pub struct SloPredicate {
    pub slo_profile_id: String,
    pub window: TimeWindow,
    pub ttft_ms_p50: f64,
    pub ttft_ms_p95: f64,
    pub tokens_per_sec_p50: f64,
    pub cost_per_1k_tokens_cap_usd: f64,
    pub error_rate_cap: f64,
    pub error_budget_remaining: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observability_query_digest: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_wire_strings_round_trip() {
        for kind in AttestationKind::ALL {
            assert_eq!(AttestationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AttestationKind::parse("bogus"), None);
    }

    #[test]
    fn predicate_uri_is_kind_specific() {
        assert_eq!(
            AttestationKind::Prompt.predicate_uri(),
            "https://llmsa.dev/attestation/prompt/v1"
        );
        assert_eq!(
            AttestationKind::Slo.predicate_uri(),
            "https://llmsa.dev/attestation/slo/v1"
        );
    }

    #[test]
    fn chain_predecessor_table() {
        assert!(AttestationKind::Prompt.required_predecessors().is_empty());
        assert!(AttestationKind::Corpus.required_predecessors().is_empty());
        assert_eq!(
            AttestationKind::Eval.required_predecessors(),
            &[AttestationKind::Prompt, AttestationKind::Corpus]
        );
        assert_eq!(
            AttestationKind::Route.required_predecessors(),
            &[AttestationKind::Eval]
        );
        assert_eq!(
            AttestationKind::Slo.required_predecessors(),
            &[AttestationKind::Route]
        );
    }

    #[test]
    fn kind_serializes_as_wire_string() {
        let json = serde_json::to_string(&AttestationKind::Prompt).expect("serialize");
        assert_eq!(json, "\"prompt_attestation\"");
    }

    #[test]
    fn privacy_optional_fields_omitted() {
        let json = serde_json::to_string(&Privacy::hash_only()).expect("serialize");
        assert_eq!(json, r#"{"mode":"hash_only"}"#);
    }
}
