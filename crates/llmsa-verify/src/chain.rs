//! Provenance-chain validation.
//!
//! The chain is a DAG with fixed topology: eval requires prompt and
//! corpus, route requires eval, slo requires route. Statements are held in
//! a flat list with two index maps (`by_type`, `by_id`); edges point at
//! the chosen predecessor or carry a detail explaining why none could be
//! chosen.

use std::collections::{BTreeSet, HashMap};

use chrono::DateTime;

use llmsa_core::statement::required_predecessors;

use crate::error::VerifyError;
use crate::report::{ChainEdge, ChainNode, ChainReport};

/// The per-bundle view the chain graph operates on.
#[derive(Debug, Clone)]
pub struct ChainStatement {
    /// Bundle path this statement came from.
    pub bundle: String,
    pub statement_id: String,
    pub attestation_type: String,
    pub generated_at: String,
    /// Parsed `depends_on` annotation tokens.
    pub depends_on: Vec<String>,
}

/// Local per-bundle constraint: `generated_at` must be a valid RFC3339
/// timestamp.
pub fn verify_generated_at(statement: &serde_json::Value) -> Result<(), VerifyError> {
    let generated_at = statement
        .get("generated_at")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if generated_at.is_empty() {
        return Err(VerifyError::Chain("generated_at is required".to_owned()));
    }
    DateTime::parse_from_rfc3339(generated_at)
        .map_err(|e| VerifyError::Chain(format!("invalid generated_at: {e}")))?;
    Ok(())
}

/// Validate the provenance-chain graph across a set of statements.
pub fn verify_provenance_chain(statements: &[ChainStatement]) -> ChainReport {
    let mut report = ChainReport {
        valid: true,
        ..ChainReport::default()
    };
    if statements.is_empty() {
        return report;
    }

    let mut by_type: HashMap<&str, Vec<&ChainStatement>> = HashMap::new();
    let mut by_id: HashMap<&str, &ChainStatement> = HashMap::new();
    for st in statements {
        by_type.entry(&st.attestation_type).or_default().push(st);
        if !st.statement_id.is_empty() {
            by_id.insert(&st.statement_id, st);
        }
        report.nodes.push(ChainNode {
            bundle: st.bundle.clone(),
            statement_id: st.statement_id.clone(),
            attestation_type: st.attestation_type.clone(),
            generated_at: st.generated_at.clone(),
            depends_on: st.depends_on.clone(),
        });
    }

    let mut violations = BTreeSet::new();
    for st in statements {
        let required = required_predecessors(&st.attestation_type);
        if required.is_empty() {
            check_unknown_dependencies(st, &by_type, &by_id, &mut violations);
            continue;
        }

        // Keep single-bundle verification usable while still enforcing
        // explicit references.
        let strict = statements.len() > 1 || !st.depends_on.is_empty();
        if !strict {
            continue;
        }

        for req in required {
            let req_type = req.as_str();
            let mut edge = ChainEdge {
                from_statement_id: st.statement_id.clone(),
                from_type: st.attestation_type.clone(),
                to_statement_id: String::new(),
                to_type: req_type.to_owned(),
                satisfied: true,
                detail: String::new(),
            };

            let Some(preds) = by_type.get(req_type).filter(|p| !p.is_empty()) else {
                edge.satisfied = false;
                edge.detail = "missing_required_attestation_type".to_owned();
                report.edges.push(edge);
                violations.insert(format!(
                    "missing chain predecessor: {} requires {}",
                    st.attestation_type, req_type
                ));
                continue;
            };

            let mut target = preds[0];
            if !st.depends_on.is_empty() {
                let mut matched = st.depends_on.iter().any(|d| d.trim() == req_type);
                if !matched {
                    for dep in &st.depends_on {
                        if let Some(&pred) = by_id.get(dep.as_str()) {
                            if pred.attestation_type == req_type {
                                target = pred;
                                matched = true;
                                break;
                            }
                        }
                    }
                }
                if !matched {
                    edge.satisfied = false;
                    edge.detail = "missing_dependency_reference".to_owned();
                    report.edges.push(edge);
                    violations.insert(format!(
                        "missing dependency reference: {} should reference {}",
                        st.statement_id, req_type
                    ));
                    continue;
                }
            }

            edge.to_statement_id = if target.statement_id.is_empty() {
                "(by-type)".to_owned()
            } else {
                target.statement_id.clone()
            };
            if !ordered(&target.generated_at, &st.generated_at) {
                edge.satisfied = false;
                edge.detail = "predecessor_generated_after_successor".to_owned();
                report.edges.push(edge);
                violations.insert(format!(
                    "invalid chain order: predecessor {} generated after {}",
                    target.statement_id, st.statement_id
                ));
                continue;
            }

            report.edges.push(edge);
        }

        check_unknown_dependencies(st, &by_type, &by_id, &mut violations);
    }

    report.violations = violations.into_iter().collect();
    report.nodes.sort_by(|a, b| {
        (a.attestation_type.as_str(), a.statement_id.as_str())
            .cmp(&(b.attestation_type.as_str(), b.statement_id.as_str()))
    });
    report.edges.sort_by(|a, b| {
        (a.from_statement_id.as_str(), a.to_type.as_str())
            .cmp(&(b.from_statement_id.as_str(), b.to_type.as_str()))
    });
    report.valid = report.violations.is_empty();
    report
}

/// Flag `depends_on` tokens that name neither a present kind nor a present
/// statement id.
fn check_unknown_dependencies(
    st: &ChainStatement,
    by_type: &HashMap<&str, Vec<&ChainStatement>>,
    by_id: &HashMap<&str, &ChainStatement>,
    violations: &mut BTreeSet<String>,
) {
    for dep in &st.depends_on {
        let dep = dep.trim();
        if dep.is_empty() || by_type.contains_key(dep) || by_id.contains_key(dep) {
            continue;
        }
        violations.insert(format!(
            "unknown dependency reference: {} -> {}",
            st.statement_id, dep
        ));
    }
}

/// Whether `predecessor` was generated no later than `successor`.
///
/// Unparseable timestamps compare as ordered — the local per-bundle check
/// already rejects malformed `generated_at`, so cross-bundle comparison
/// stays permissive.
fn ordered(predecessor_generated_at: &str, successor_generated_at: &str) -> bool {
    let Ok(predecessor) = DateTime::parse_from_rfc3339(predecessor_generated_at) else {
        return true;
    };
    let Ok(successor) = DateTime::parse_from_rfc3339(successor_generated_at) else {
        return true;
    };
    predecessor <= successor
}
