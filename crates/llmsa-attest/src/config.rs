//! Collector and project configuration loading.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::AttestError;

/// Load a YAML config file into a typed structure.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<T, AttestError> {
    let raw = std::fs::read_to_string(path).map_err(|e| AttestError::ReadConfig {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&raw).map_err(|e| AttestError::ParseConfig {
        path: path.display().to_string(),
        source: e,
    })
}

/// Project-level configuration (`llmsa.yaml`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectConfig {
    /// Attestation kind to collector config path.
    #[serde(default)]
    pub collectors: BTreeMap<String, String>,
    /// Attestation kind to changed-path trigger patterns.
    #[serde(default)]
    pub path_rules: BTreeMap<String, Vec<String>>,
}

/// The default project configuration written by `llmsa init`.
pub fn default_project_config() -> ProjectConfig {
    let collectors = [
        ("prompt_attestation", "demos/tiny-rag/configs/prompt.yaml"),
        ("corpus_attestation", "demos/tiny-rag/configs/corpus.yaml"),
        ("eval_attestation", "demos/tiny-rag/configs/eval.yaml"),
        ("route_attestation", "demos/tiny-rag/configs/route.yaml"),
        ("slo_attestation", "demos/tiny-rag/configs/slo.yaml"),
    ];
    let path_rules = [
        ("prompt_attestation", vec!["prompt/**", "prompts/**", "demos/tiny-rag/app/**"]),
        ("corpus_attestation", vec!["corpus/**", "data/**", "demos/tiny-rag/data/**"]),
        ("eval_attestation", vec!["eval/**", "demos/tiny-rag/eval/**"]),
        ("route_attestation", vec!["route/**", "demos/tiny-rag/route/**"]),
        ("slo_attestation", vec!["slo/**", "demos/tiny-rag/slo/**"]),
    ];

    ProjectConfig {
        collectors: collectors
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect(),
        path_rules: path_rules
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.into_iter().map(str::to_owned).collect()))
            .collect(),
    }
}

/// Resolve a config-referenced path: absolute as-is, then CWD-relative,
/// then relative to the config file's directory. Unresolvable candidates
/// are returned unchanged so the later existence check reports them.
pub fn resolve_path(config_path: &Path, candidate: &str) -> String {
    if candidate.is_empty() {
        return String::new();
    }
    let candidate_path = PathBuf::from(candidate);
    if candidate_path.is_absolute() || candidate_path.exists() {
        return candidate.to_owned();
    }
    if let Some(dir) = config_path.parent() {
        let joined = dir.join(candidate);
        if joined.exists() {
            return joined.to_string_lossy().replace('\\', "/");
        }
    }
    candidate.to_owned()
}

/// Require a non-empty, readable path for a named config field.
pub fn require_path(path: &str, name: &'static str) -> Result<(), AttestError> {
    if path.is_empty() {
        return Err(AttestError::MissingField(name));
    }
    std::fs::metadata(path).map_err(|e| AttestError::MissingPath {
        name,
        path: path.to_owned(),
        source: e,
    })?;
    Ok(())
}
