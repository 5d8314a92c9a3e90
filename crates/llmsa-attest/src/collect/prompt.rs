//! Prompt attestation collector.

use std::path::Path;

use serde::Deserialize;

use llmsa_core::digest::digest_file;
use llmsa_core::statement::{AttestationKind, Predicate, PromptPredicate, Statement};

use crate::config::{load_config, require_path, resolve_path};
use crate::error::AttestError;
use crate::statement::{bundle_digest, new_statement, sorted_file_digests, subject_from_path};

/// Declarative config for the prompt collector.
#[derive(Debug, Default, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub templates_dir: String,
    #[serde(default)]
    pub tool_schemas_dir: String,
    #[serde(default)]
    pub safety_policy: String,
    #[serde(default)]
    pub render_config: String,
    #[serde(default)]
    pub test_suite: String,
    #[serde(default)]
    pub sensitivity_labels: Vec<String>,
}

/// Collect a prompt attestation statement.
pub fn collect_prompt(config_path: &Path) -> Result<Statement, AttestError> {
    let mut cfg: PromptConfig = load_config(config_path)?;
    cfg.system_prompt = resolve_path(config_path, &cfg.system_prompt);
    cfg.templates_dir = resolve_path(config_path, &cfg.templates_dir);
    cfg.tool_schemas_dir = resolve_path(config_path, &cfg.tool_schemas_dir);
    cfg.safety_policy = resolve_path(config_path, &cfg.safety_policy);
    cfg.render_config = resolve_path(config_path, &cfg.render_config);
    cfg.test_suite = resolve_path(config_path, &cfg.test_suite);

    require_path(&cfg.system_prompt, "system_prompt")?;
    require_path(&cfg.templates_dir, "templates_dir")?;
    require_path(&cfg.tool_schemas_dir, "tool_schemas_dir")?;
    require_path(&cfg.safety_policy, "safety_policy")?;

    let (system_digest, _) = digest_file(Path::new(&cfg.system_prompt))?;
    let (template_digests, template_subjects) = sorted_file_digests(&cfg.templates_dir)?;
    let (tool_digests, tool_subjects) = sorted_file_digests(&cfg.tool_schemas_dir)?;
    let (safety_digest, _) = digest_file(Path::new(&cfg.safety_policy))?;

    let mut predicate = PromptPredicate {
        prompt_bundle_digest: bundle_digest([
            system_digest.clone(),
            safety_digest.clone(),
            bundle_digest(template_digests.clone()),
            bundle_digest(tool_digests.clone()),
        ]),
        system_prompt_digest: system_digest,
        template_digests,
        tool_schema_digests: tool_digests,
        safety_policy_digest: safety_digest,
        prompt_render_config_digest: None,
        prompt_test_suite_digest: None,
        sensitivity_labels: cfg.sensitivity_labels.clone(),
    };
    if !cfg.render_config.is_empty() {
        let (d, _) = digest_file(Path::new(&cfg.render_config))?;
        predicate.prompt_render_config_digest = Some(d);
    }
    if !cfg.test_suite.is_empty() {
        let (d, _) = digest_file(Path::new(&cfg.test_suite))?;
        predicate.prompt_test_suite_digest = Some(d);
    }

    let mut subjects = Vec::with_capacity(2 + template_subjects.len() + tool_subjects.len());
    subjects.push(subject_from_path(&cfg.system_prompt)?);
    subjects.push(subject_from_path(&cfg.safety_policy)?);
    subjects.extend(template_subjects);
    subjects.extend(tool_subjects);

    Ok(new_statement(
        AttestationKind::Prompt,
        Predicate::Prompt(predicate),
        subjects,
        vec![],
    ))
}
