//! Route attestation collector.

use std::path::Path;

use serde::Deserialize;

use llmsa_core::digest::digest_file;
use llmsa_core::statement::{
    AttestationKind, Predicate, ProviderModel, RoutePredicate, Statement,
};

use crate::config::{load_config, require_path, resolve_path};
use crate::error::AttestError;
use crate::statement::{new_statement, set_depends_on, subject_from_path};

/// Declarative config for the route collector.
#[derive(Debug, Default, Deserialize)]
pub struct RouteConfig {
    #[serde(default)]
    pub route_config: String,
    #[serde(default)]
    pub provider_set: Vec<ProviderModel>,
    #[serde(default)]
    pub budget_policy: String,
    #[serde(default)]
    pub fallback_graph: String,
    #[serde(default)]
    pub routing_strategy: String,
    #[serde(default)]
    pub canary_config: String,
    #[serde(default)]
    pub simulation_result: String,
}

/// Collect a route attestation statement.
pub fn collect_route(config_path: &Path) -> Result<Statement, AttestError> {
    let mut cfg: RouteConfig = load_config(config_path)?;
    cfg.route_config = resolve_path(config_path, &cfg.route_config);
    cfg.budget_policy = resolve_path(config_path, &cfg.budget_policy);
    cfg.fallback_graph = resolve_path(config_path, &cfg.fallback_graph);
    cfg.canary_config = resolve_path(config_path, &cfg.canary_config);
    cfg.simulation_result = resolve_path(config_path, &cfg.simulation_result);

    require_path(&cfg.route_config, "route_config")?;
    require_path(&cfg.budget_policy, "budget_policy")?;
    require_path(&cfg.fallback_graph, "fallback_graph")?;
    if cfg.routing_strategy.is_empty() {
        return Err(AttestError::MissingField("routing_strategy"));
    }
    if cfg.provider_set.is_empty() {
        return Err(AttestError::MissingField("provider_set"));
    }

    let (route_digest, _) = digest_file(Path::new(&cfg.route_config))?;
    let (budget_digest, _) = digest_file(Path::new(&cfg.budget_policy))?;
    let (fallback_digest, _) = digest_file(Path::new(&cfg.fallback_graph))?;

    let mut predicate = RoutePredicate {
        route_config_digest: route_digest,
        provider_set: cfg.provider_set.clone(),
        budget_policy_digest: budget_digest,
        fallback_graph_digest: fallback_digest,
        routing_strategy: cfg.routing_strategy.clone(),
        canary_config_digest: None,
        simulation_result_digest: None,
    };
    if !cfg.canary_config.is_empty() {
        let (d, _) = digest_file(Path::new(&cfg.canary_config))?;
        predicate.canary_config_digest = Some(d);
    }
    if !cfg.simulation_result.is_empty() {
        let (d, _) = digest_file(Path::new(&cfg.simulation_result))?;
        predicate.simulation_result_digest = Some(d);
    }

    let mut subjects = Vec::with_capacity(3);
    for path in [&cfg.route_config, &cfg.budget_policy, &cfg.fallback_graph] {
        subjects.push(subject_from_path(path)?);
    }

    let mut statement = new_statement(
        AttestationKind::Route,
        Predicate::Route(predicate),
        subjects,
        vec![],
    );
    set_depends_on(&mut statement, &[AttestationKind::Eval.as_str()]);
    Ok(statement)
}
