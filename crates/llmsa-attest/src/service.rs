//! Attestation orchestration: statement creation, determinism self-check,
//! and changed-paths-to-kinds mapping.

use std::path::{Path, PathBuf};

use llmsa_core::canonical::hash_canonical_json;
use llmsa_core::digest::file_exists;
use llmsa_core::pathmatch::path_matches;
use llmsa_core::statement::Statement;

use crate::collect::collect_by_type;
use crate::config::{default_project_config, load_config, ProjectConfig};
use crate::error::AttestError;
use crate::privacy::apply_privacy;
use crate::vcs;

/// Options for a single `attest create` invocation.
#[derive(Debug, Clone, Default)]
pub struct CreateOptions {
    /// Attestation kind wire string.
    pub attestation_type: String,
    /// Collector config path.
    pub config_path: PathBuf,
    /// Output directory for statement files.
    pub out_dir: PathBuf,
    /// Re-run the collector this many times and compare hashes (> 1).
    pub determinism_check: u32,
}

/// Collect one statement and write it to the output directory.
///
/// Returns the paths of the written statement files.
pub fn create_by_type(opts: &CreateOptions) -> Result<Vec<PathBuf>, AttestError> {
    if opts.out_dir.as_os_str().is_empty() {
        return Err(AttestError::Invalid("--out is required".to_owned()));
    }
    std::fs::create_dir_all(&opts.out_dir)
        .map_err(|e| AttestError::io(format!("create out dir {}", opts.out_dir.display()), e))?;

    let mut statement = collect_by_type(&opts.attestation_type, &opts.config_path)?;
    apply_privacy(&mut statement, &opts.config_path)?;

    if opts.determinism_check > 1 {
        run_determinism_check(&statement, opts)?;
    }

    let file_name = format!(
        "statement_{}_{}.json",
        statement.attestation_type, statement.statement_id
    );
    let out_path = opts.out_dir.join(file_name);
    let raw = serde_json::to_vec_pretty(&statement)
        .map_err(llmsa_core::CoreError::from)?;
    std::fs::write(&out_path, raw)
        .map_err(|e| AttestError::io(format!("write statement {}", out_path.display()), e))?;
    tracing::info!(path = %out_path.display(), kind = %statement.attestation_type, "wrote statement");
    Ok(vec![out_path])
}

/// Re-run the collector and require identical canonical hashes.
///
/// `statement_id` and `generated_at` are runtime nonces and are overwritten
/// with the first run's values before comparison.
fn run_determinism_check(first: &Statement, opts: &CreateOptions) -> Result<(), AttestError> {
    let (first_hash, _) = hash_canonical_json(first)?;
    for _ in 1..opts.determinism_check {
        let mut again = collect_by_type(&opts.attestation_type, &opts.config_path)?;
        apply_privacy(&mut again, &opts.config_path)?;
        again.statement_id = first.statement_id.clone();
        again.generated_at = first.generated_at.clone();
        let (next_hash, _) = hash_canonical_json(&again)?;
        if next_hash != first_hash {
            return Err(AttestError::Determinism {
                first: first_hash,
                next: next_hash,
            });
        }
    }
    Ok(())
}

/// Create attestations for every kind whose path rules match the files
/// changed since `git_ref`.
pub fn create_changed_only(
    git_ref: &str,
    out_dir: &Path,
    determinism_check: u32,
) -> Result<Vec<PathBuf>, AttestError> {
    let mut cfg = default_project_config();
    if file_exists(Path::new("llmsa.yaml")) {
        cfg = load_config(Path::new("llmsa.yaml"))?;
    }

    let changed = vcs::changed_files(git_ref);
    let mut kinds = infer_attestation_types(&changed, &cfg);
    if kinds.is_empty() {
        return Err(AttestError::Invalid(
            "no changed artifacts mapped to attestation rules".to_owned(),
        ));
    }
    kinds.sort();

    let mut created = Vec::new();
    for kind in kinds {
        let config_path = cfg
            .collectors
            .get(&kind)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                AttestError::Invalid(format!("missing collector config for {kind}"))
            })?;
        let out = create_by_type(&CreateOptions {
            attestation_type: kind,
            config_path: PathBuf::from(config_path),
            out_dir: out_dir.to_path_buf(),
            determinism_check,
        })?;
        created.extend(out);
    }
    Ok(created)
}

/// Map changed paths through the project path rules to attestation kinds.
pub fn infer_attestation_types(changed: &[String], cfg: &ProjectConfig) -> Vec<String> {
    let mut kinds = Vec::new();
    for (kind, patterns) in &cfg.path_rules {
        let hit = changed
            .iter()
            .any(|path| patterns.iter().any(|p| path_matches(path, p)));
        if hit {
            kinds.push(kind.clone());
        }
    }
    kinds
}
