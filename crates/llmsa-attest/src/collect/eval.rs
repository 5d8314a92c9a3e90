//! Eval attestation collector.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use llmsa_core::digest::digest_file;
use llmsa_core::statement::{AttestationKind, EvalPredicate, Predicate, Statement};

use crate::config::{load_config, require_path, resolve_path};
use crate::error::AttestError;
use crate::statement::{new_statement, set_depends_on, subject_from_path};

/// Declarative config for the eval collector.
#[derive(Debug, Default, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub eval_suite_id: String,
    #[serde(default)]
    pub testset: String,
    #[serde(default)]
    pub scoring_config: String,
    #[serde(default)]
    pub baseline_results: String,
    #[serde(default)]
    pub candidate_results: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
    #[serde(default)]
    pub run_environment: String,
}

/// Collect an eval attestation statement.
///
/// `regression_detected` is derived: any `<name>_min` threshold with the
/// metric below it, or `<name>_max` with the metric above it.
pub fn collect_eval(config_path: &Path) -> Result<Statement, AttestError> {
    let mut cfg: EvalConfig = load_config(config_path)?;
    cfg.testset = resolve_path(config_path, &cfg.testset);
    cfg.scoring_config = resolve_path(config_path, &cfg.scoring_config);
    cfg.baseline_results = resolve_path(config_path, &cfg.baseline_results);
    cfg.candidate_results = resolve_path(config_path, &cfg.candidate_results);
    cfg.run_environment = resolve_path(config_path, &cfg.run_environment);

    if cfg.eval_suite_id.is_empty() {
        return Err(AttestError::MissingField("eval_suite_id"));
    }
    require_path(&cfg.testset, "testset")?;
    require_path(&cfg.scoring_config, "scoring_config")?;
    require_path(&cfg.baseline_results, "baseline_results")?;
    require_path(&cfg.candidate_results, "candidate_results")?;

    let (testset_digest, _) = digest_file(Path::new(&cfg.testset))?;
    let (scoring_digest, _) = digest_file(Path::new(&cfg.scoring_config))?;
    let (baseline_digest, _) = digest_file(Path::new(&cfg.baseline_results))?;
    let (candidate_digest, _) = digest_file(Path::new(&cfg.candidate_results))?;

    let regression = regression_detected(&cfg.metrics, &cfg.thresholds);

    let mut predicate = EvalPredicate {
        eval_suite_id: cfg.eval_suite_id.clone(),
        testset_digest,
        scoring_config_digest: scoring_digest,
        baseline_result_digest: baseline_digest,
        candidate_result_digest: candidate_digest,
        metrics: cfg.metrics.clone(),
        thresholds: cfg.thresholds.clone(),
        regression_detected: regression,
        run_environment_digest: None,
    };
    if !cfg.run_environment.is_empty() {
        let (d, _) = digest_file(Path::new(&cfg.run_environment))?;
        predicate.run_environment_digest = Some(d);
    }

    let mut subjects = Vec::with_capacity(4);
    for path in [
        &cfg.testset,
        &cfg.scoring_config,
        &cfg.baseline_results,
        &cfg.candidate_results,
    ] {
        subjects.push(subject_from_path(path)?);
    }

    let mut statement = new_statement(
        AttestationKind::Eval,
        Predicate::Eval(predicate),
        subjects,
        vec![],
    );
    set_depends_on(
        &mut statement,
        &[
            AttestationKind::Prompt.as_str(),
            AttestationKind::Corpus.as_str(),
        ],
    );
    Ok(statement)
}

fn regression_detected(
    metrics: &BTreeMap<String, f64>,
    thresholds: &BTreeMap<String, f64>,
) -> bool {
    for (key, threshold) in thresholds {
        if let Some(metric) = key.strip_suffix("_min") {
            if metrics.get(metric).copied().unwrap_or_default() < *threshold {
                return true;
            }
        }
        if let Some(metric) = key.strip_suffix("_max") {
            if metrics.get(metric).copied().unwrap_or_default() > *threshold {
                return true;
            }
        }
    }
    false
}
