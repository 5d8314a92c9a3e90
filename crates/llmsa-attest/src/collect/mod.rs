//! Per-kind statement collectors.
//!
//! Collectors are selected through a dispatch table keyed by attestation
//! kind. Each one reads its declarative config, resolves and digests the
//! referenced artifacts, and returns a typed statement.

use std::path::Path;

use llmsa_core::statement::{AttestationKind, Statement};

use crate::error::AttestError;

mod corpus;
mod eval;
mod prompt;
mod route;
mod slo;

pub use corpus::{collect_corpus, CorpusConfig};
pub use eval::{collect_eval, EvalConfig};
pub use prompt::{collect_prompt, PromptConfig};
pub use route::{collect_route, RouteConfig};
pub use slo::{collect_slo, SloConfig};

/// Run the collector for the given attestation kind.
pub fn collect_by_type(att_type: &str, config_path: &Path) -> Result<Statement, AttestError> {
    match AttestationKind::parse(att_type) {
        Some(AttestationKind::Prompt) => collect_prompt(config_path),
        Some(AttestationKind::Corpus) => collect_corpus(config_path),
        Some(AttestationKind::Eval) => collect_eval(config_path),
        Some(AttestationKind::Route) => collect_route(config_path),
        Some(AttestationKind::Slo) => collect_slo(config_path),
        None => Err(AttestError::UnsupportedType(att_type.to_owned())),
    }
}
