//! The verification engine.
//!
//! Per-bundle checks run in a fixed order — signature, payload decode,
//! schema, local chain constraint, subject re-digest — and the first
//! failure stops that bundle so tampered content cannot produce a more
//! specific error than a signature failure. Content errors never abort
//! the batch: each failure is recorded and the engine moves on. After all
//! bundles, the provenance-chain graph is validated across the set.

use std::path::{Path, PathBuf};

use llmsa_core::bundle;

use crate::chain::{verify_generated_at, verify_provenance_chain, ChainStatement};
use crate::report::{
    Report, StatementSummary, EXIT_DIGEST_MISMATCH, EXIT_MISSING, EXIT_PASS,
    EXIT_SCHEMA_FAIL, EXIT_SIGNATURE_FAIL,
};
use crate::schema_check::verify_schemas;
use crate::signature::{verify_signature, SignerPolicy};
use crate::subject::verify_subjects;
use crate::VerifyError;

/// Inputs to a verification run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// A bundle file or a directory containing `*.bundle.json` files.
    pub source_path: PathBuf,
    /// Directory holding `statement.schema.json` and the per-kind schemas.
    pub schema_dir: PathBuf,
    /// Constraints on acceptable signers.
    pub signer_policy: SignerPolicy,
}

/// Run the engine and produce an aggregated report.
pub fn run(opts: &Options) -> Report {
    let mut report = Report::new();

    let paths = match bundle_paths(&opts.source_path) {
        Ok(paths) => paths,
        Err(e) => {
            report.passed = false;
            report.exit_code = EXIT_MISSING;
            report.violations.push(e.to_string());
            return report;
        }
    };
    if paths.is_empty() {
        report.passed = false;
        report.exit_code = EXIT_MISSING;
        report.violations.push("no bundle files found".to_owned());
        return report;
    }
    report.bundle_count = paths.len();
    let mut chain_statements = Vec::with_capacity(paths.len());

    for path in &paths {
        let bundle_name = path.display().to_string();

        let bundle = match bundle::read_bundle(path) {
            Ok(b) => b,
            Err(e) => {
                report.add_failure(&bundle_name, "bundle_read", EXIT_MISSING, &e.to_string());
                continue;
            }
        };

        if let Err(e) = verify_signature(&bundle, &opts.signer_policy) {
            report.add_failure(&bundle_name, "signature", EXIT_SIGNATURE_FAIL, &e.to_string());
            continue;
        }
        report.add_pass(&bundle_name, "signature");

        let statement: serde_json::Value = match bundle::decode_payload(&bundle) {
            Ok(v) => v,
            Err(e) => {
                report.add_failure(&bundle_name, "payload_decode", EXIT_MISSING, &e.to_string());
                continue;
            }
        };

        if let Err(e) = verify_schemas(&opts.schema_dir, &statement) {
            report.add_failure(&bundle_name, "schema", EXIT_SCHEMA_FAIL, &e.to_string());
            continue;
        }
        report.add_pass(&bundle_name, "schema");

        if let Err(e) = verify_generated_at(&statement) {
            report.add_failure(&bundle_name, "chain", EXIT_SCHEMA_FAIL, &e.to_string());
            continue;
        }
        report.add_pass(&bundle_name, "chain");

        if let Err(e) = verify_subjects(&statement) {
            report.add_failure(
                &bundle_name,
                "subject_digest",
                EXIT_DIGEST_MISMATCH,
                &e.to_string(),
            );
            continue;
        }
        report.add_pass(&bundle_name, "subject_digest");

        let depends_on = parse_depends_on(&statement);
        report.statements.push(StatementSummary {
            attestation_type: str_field(&statement, "attestation_type"),
            statement_id: str_field(&statement, "statement_id"),
            privacy_mode: privacy_mode(&statement),
            depends_on: depends_on.clone(),
            generated_at: str_field(&statement, "generated_at"),
        });
        chain_statements.push(ChainStatement {
            bundle: bundle_name,
            statement_id: str_field(&statement, "statement_id"),
            attestation_type: str_field(&statement, "attestation_type"),
            generated_at: str_field(&statement, "generated_at"),
            depends_on,
        });
    }

    report.chain = verify_provenance_chain(&chain_statements);
    if report.chain.valid {
        report.add_pass("<all>", "chain_graph");
    } else {
        let mut message = report.chain.violations.join("; ");
        if message.is_empty() {
            message = "invalid provenance chain".to_owned();
        }
        report.add_failure("<all>", "chain_graph", EXIT_SCHEMA_FAIL, &message);
    }

    if report.passed {
        report.exit_code = EXIT_PASS;
    }
    tracing::debug!(
        bundles = report.bundle_count,
        passed = report.passed,
        exit_code = report.exit_code,
        "verification run complete"
    );
    report
}

/// Resolve the source into a sorted list of bundle files.
fn bundle_paths(source: &Path) -> Result<Vec<PathBuf>, VerifyError> {
    let meta = std::fs::metadata(source)
        .map_err(|e| VerifyError::io(format!("stat source {}", source.display()), e))?;
    if !meta.is_dir() {
        return Ok(vec![source.to_path_buf()]);
    }

    let mut files = Vec::new();
    let entries = std::fs::read_dir(source)
        .map_err(|e| VerifyError::io(format!("read source {}", source.display()), e))?;
    for entry in entries {
        let entry =
            entry.map_err(|e| VerifyError::io(format!("read source {}", source.display()), e))?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(".bundle.json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn str_field(statement: &serde_json::Value, key: &str) -> String {
    statement
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned()
}

fn privacy_mode(statement: &serde_json::Value) -> String {
    statement
        .get("privacy")
        .and_then(|p| p.get("mode"))
        .and_then(|m| m.as_str())
        .unwrap_or_default()
        .to_owned()
}

/// Parse the `depends_on` annotation into sorted tokens.
pub fn parse_depends_on(statement: &serde_json::Value) -> Vec<String> {
    let raw = statement
        .get("annotations")
        .and_then(|a| a.get("depends_on"))
        .and_then(|d| d.as_str())
        .unwrap_or_default();
    if raw.trim().is_empty() {
        return Vec::new();
    }
    let mut deps: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect();
    deps.sort();
    deps
}
