//! The YAML policy gate.
//!
//! A policy document declares gates triggered by changed paths and the
//! attestation kinds each gate requires, plus a plaintext allowlist. The
//! privacy-exposure rule short-circuits everything: any statement in
//! `plaintext_explicit` mode whose id is not allowlisted blocks the gate
//! with a single fixed message.

use std::path::Path;

use serde::Deserialize;

use llmsa_core::bundle;
use llmsa_core::pathmatch::path_matches;

use crate::error::VerifyError;

/// Message emitted when a plaintext statement is not allowlisted.
pub const PLAINTEXT_BLOCKED: &str = "Sensitive payload exposure blocked by policy.";

/// A policy document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub oidc_issuer: String,
    #[serde(default)]
    pub identity_regex: String,
    /// Statement ids allowed to use `plaintext_explicit`.
    #[serde(default)]
    pub plaintext_allowlist: Vec<String>,
    #[serde(default)]
    pub gates: Vec<Gate>,
}

/// One gate rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Gate {
    pub id: String,
    /// Changed-path patterns that trigger this gate.
    #[serde(default)]
    pub trigger_paths: Vec<String>,
    /// Attestation kinds that must be present when triggered.
    #[serde(default)]
    pub required_attestations: Vec<String>,
    /// Violation message; a default is derived when empty.
    #[serde(default)]
    pub message: String,
}

/// The slice of a statement the gate evaluator consumes.
#[derive(Debug, Clone)]
pub struct StatementView {
    pub attestation_type: String,
    pub statement_id: String,
    pub privacy_mode: String,
}

/// Load a policy document from YAML.
pub fn load_policy(path: &Path) -> Result<Policy, VerifyError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| VerifyError::io(format!("read policy {}", path.display()), e))?;
    Ok(serde_yaml::from_str(&raw)?)
}

/// Load statement views from a bundle file, a statement file, or a
/// directory of either.
pub fn load_statements(source: &Path) -> Result<Vec<StatementView>, VerifyError> {
    let meta = std::fs::metadata(source)
        .map_err(|e| VerifyError::io(format!("stat source {}", source.display()), e))?;
    let mut paths = Vec::new();
    if meta.is_dir() {
        let entries = std::fs::read_dir(source)
            .map_err(|e| VerifyError::io(format!("read source {}", source.display()), e))?;
        for entry in entries {
            let entry = entry
                .map_err(|e| VerifyError::io(format!("read source {}", source.display()), e))?;
            let path = entry.path();
            if path.is_dir() {
                continue;
            }
            if path.to_string_lossy().ends_with(".json") {
                paths.push(path);
            }
        }
    } else {
        paths.push(source.to_path_buf());
    }
    paths.sort();

    let mut views = Vec::new();
    for path in paths {
        if path.to_string_lossy().ends_with(".bundle.json") {
            let b = bundle::read_bundle(&path)?;
            let payload: serde_json::Value = bundle::decode_payload(&b)?;
            views.push(extract_view(&payload));
            continue;
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| VerifyError::io(format!("read statement {}", path.display()), e))?;
        let payload: serde_json::Value = serde_json::from_str(&raw)?;
        if payload.get("attestation_type").is_some() {
            views.push(extract_view(&payload));
        }
    }
    Ok(views)
}

fn extract_view(payload: &serde_json::Value) -> StatementView {
    StatementView {
        attestation_type: str_field(payload, "attestation_type"),
        statement_id: str_field(payload, "statement_id"),
        privacy_mode: payload
            .get("privacy")
            .and_then(|p| p.get("mode"))
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_owned(),
    }
}

fn str_field(payload: &serde_json::Value, key: &str) -> String {
    payload
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned()
}

/// Evaluate the policy against present statements and changed paths.
///
/// Violations are deduplicated and returned in insertion order.
pub fn evaluate(policy: &Policy, statements: &[StatementView], changed: &[String]) -> Vec<String> {
    let mut present = std::collections::BTreeSet::new();
    let allowlisted: std::collections::BTreeSet<&str> = policy
        .plaintext_allowlist
        .iter()
        .map(String::as_str)
        .collect();
    for st in statements {
        present.insert(st.attestation_type.as_str());
        if st.privacy_mode == "plaintext_explicit"
            && !allowlisted.contains(st.statement_id.as_str())
        {
            return vec![PLAINTEXT_BLOCKED.to_owned()];
        }
    }

    let mut violations = Vec::new();
    let mut seen = std::collections::BTreeSet::new();
    for gate in &policy.gates {
        if !triggered(changed, &gate.trigger_paths) {
            continue;
        }
        let missing: Vec<&str> = gate
            .required_attestations
            .iter()
            .map(String::as_str)
            .filter(|req| !present.contains(req))
            .collect();
        if missing.is_empty() {
            continue;
        }
        let message = if gate.message.is_empty() {
            format!("{} missing attestations: {}", gate.id, missing.join(", "))
        } else {
            gate.message.clone()
        };
        if seen.insert(message.clone()) {
            violations.push(message);
        }
    }
    violations
}

fn triggered(changed: &[String], patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| changed.iter().any(|path| path_matches(path, pattern)))
}
