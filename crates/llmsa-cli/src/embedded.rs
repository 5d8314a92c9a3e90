//! Default assets materialized by `llmsa init`.

/// Default project configuration (`llmsa.yaml`).
pub const DEFAULT_CONFIG_YAML: &str = r#"collectors:
  prompt_attestation: demos/tiny-rag/configs/prompt.yaml
  corpus_attestation: demos/tiny-rag/configs/corpus.yaml
  eval_attestation: demos/tiny-rag/configs/eval.yaml
  route_attestation: demos/tiny-rag/configs/route.yaml
  slo_attestation: demos/tiny-rag/configs/slo.yaml
path_rules:
  prompt_attestation:
    - demos/tiny-rag/app/**
  corpus_attestation:
    - demos/tiny-rag/data/**
  eval_attestation:
    - demos/tiny-rag/eval/**
  route_attestation:
    - demos/tiny-rag/route/**
  slo_attestation:
    - demos/tiny-rag/slo/**
"#;

/// Starter policy (`policy/examples/mvp-gates.yaml`).
pub const DEFAULT_POLICY_YAML: &str = r#"version: 1
oidc_issuer: https://token.actions.githubusercontent.com
identity_regex: '^https://github\.com/.+/.+/\.github/workflows/.+@refs/.+$'
plaintext_allowlist: []
gates:
  - id: G001
    trigger_paths: ["demos/tiny-rag/app/**"]
    required_attestations: ["prompt_attestation", "eval_attestation"]
    message: "Prompt changed without passing eval attestation."
  - id: G002
    trigger_paths: ["demos/tiny-rag/data/**"]
    required_attestations: ["corpus_attestation", "eval_attestation"]
    message: "Corpus changed without rebuild+eval attestations."
  - id: G003
    trigger_paths: ["demos/tiny-rag/route/**"]
    required_attestations: ["route_attestation", "slo_attestation"]
    message: "Route changed without valid SLO attestation."
  - id: G004
    trigger_paths: ["demos/tiny-rag/eval/**"]
    required_attestations: ["eval_attestation"]
    message: "Eval config changed without signed eval attestation."
  - id: G005
    trigger_paths: ["refs/tags/v*"]
    required_attestations: ["prompt_attestation", "corpus_attestation", "eval_attestation", "route_attestation", "slo_attestation"]
    message: "Release blocked: incomplete attestation set."
"#;

/// Schema documents shipped with the repository, embedded so `init` can
/// materialize them into fresh checkouts.
pub const SCHEMAS: &[(&str, &str)] = &[
    (
        "statement.schema.json",
        include_str!("../../../schemas/v1/statement.schema.json"),
    ),
    (
        "prompt_attestation.schema.json",
        include_str!("../../../schemas/v1/prompt_attestation.schema.json"),
    ),
    (
        "corpus_attestation.schema.json",
        include_str!("../../../schemas/v1/corpus_attestation.schema.json"),
    ),
    (
        "eval_attestation.schema.json",
        include_str!("../../../schemas/v1/eval_attestation.schema.json"),
    ),
    (
        "route_attestation.schema.json",
        include_str!("../../../schemas/v1/route_attestation.schema.json"),
    ),
    (
        "slo_attestation.schema.json",
        include_str!("../../../schemas/v1/slo_attestation.schema.json"),
    ),
];
