//! SLO attestation collector.

use std::path::Path;

use serde::Deserialize;

use llmsa_core::digest::digest_file;
use llmsa_core::statement::{
    AttestationKind, Predicate, SloPredicate, Statement, TimeWindow,
};

use crate::config::{load_config, require_path, resolve_path};
use crate::error::AttestError;
use crate::statement::{new_statement, set_depends_on, subject_from_path};

/// Declarative config for the SLO collector.
#[derive(Debug, Default, Deserialize)]
pub struct SloConfig {
    #[serde(default)]
    pub slo_profile_id: String,
    #[serde(default)]
    pub window_start: String,
    #[serde(default)]
    pub window_end: String,
    #[serde(default)]
    pub ttft_ms_p50: f64,
    #[serde(default)]
    pub ttft_ms_p95: f64,
    #[serde(default)]
    pub tokens_per_sec_p50: f64,
    #[serde(default)]
    pub cost_per_1k_tokens_cap_usd: f64,
    #[serde(default)]
    pub error_rate_cap: f64,
    #[serde(default)]
    pub error_budget_remaining: f64,
    #[serde(default)]
    pub observability_query: String,
}

/// Collect an SLO attestation statement.
pub fn collect_slo(config_path: &Path) -> Result<Statement, AttestError> {
    let mut cfg: SloConfig = load_config(config_path)?;
    cfg.observability_query = resolve_path(config_path, &cfg.observability_query);

    if cfg.slo_profile_id.is_empty() || cfg.window_start.is_empty() || cfg.window_end.is_empty() {
        return Err(AttestError::Invalid(
            "slo_profile_id, window_start and window_end are required".to_owned(),
        ));
    }

    let mut predicate = SloPredicate {
        slo_profile_id: cfg.slo_profile_id.clone(),
        window: TimeWindow {
            start: cfg.window_start.clone(),
            end: cfg.window_end.clone(),
        },
        ttft_ms_p50: cfg.ttft_ms_p50,
        ttft_ms_p95: cfg.ttft_ms_p95,
        tokens_per_sec_p50: cfg.tokens_per_sec_p50,
        cost_per_1k_tokens_cap_usd: cfg.cost_per_1k_tokens_cap_usd,
        error_rate_cap: cfg.error_rate_cap,
        error_budget_remaining: cfg.error_budget_remaining,
        observability_query_digest: None,
    };

    let mut subjects = Vec::new();
    if !cfg.observability_query.is_empty() {
        require_path(&cfg.observability_query, "observability_query")?;
        let (d, _) = digest_file(Path::new(&cfg.observability_query))?;
        predicate.observability_query_digest = Some(d);
        subjects.push(subject_from_path(&cfg.observability_query)?);
    }

    let mut statement = new_statement(
        AttestationKind::Slo,
        Predicate::Slo(predicate),
        subjects,
        vec![],
    );
    set_depends_on(&mut statement, &[AttestationKind::Route.as_str()]);
    Ok(statement)
}
