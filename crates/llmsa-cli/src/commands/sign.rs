//! The `llmsa sign` subcommand.

use std::path::{Path, PathBuf};

use clap::Args;
use color_eyre::eyre::{bail, Result};

use llmsa_core::bundle::{create_bundle, write_bundle};
use llmsa_core::canonical::canonical_json;
use llmsa_core::signer::{kms_sign, PemSigner, SigstoreSigner};

/// Arguments for `llmsa sign`.
#[derive(Args)]
pub struct SignArgs {
    /// Statement JSON input.
    #[arg(long, value_name = "PATH")]
    pub r#in: PathBuf,

    /// Signing provider.
    #[arg(long, value_name = "PROVIDER", default_value = "sigstore")]
    pub provider: String,

    /// Bundle output path (file or directory).
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// PEM key path.
    #[arg(long, value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// Sigstore OIDC issuer.
    #[arg(long, value_name = "URL")]
    pub oidc_issuer: Option<String>,

    /// Sigstore OIDC identity.
    #[arg(long, value_name = "IDENTITY")]
    pub oidc_identity: Option<String>,
}

/// Execute the sign command.
pub fn execute(args: SignArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.r#in)?;
    let statement: serde_json::Value = serde_json::from_str(&raw)?;
    let canonical = canonical_json(&statement)?;

    let material = match args.provider.as_str() {
        "pem" => {
            let Some(ref key) = args.key else {
                bail!("--key is required for pem provider");
            };
            PemSigner::from_file(key)?.sign(&canonical)?
        }
        "sigstore" => {
            SigstoreSigner::new(args.key.clone(), args.oidc_issuer, args.oidc_identity)
                .sign(&canonical)?
        }
        "kms" => {
            kms_sign(&canonical)?;
            unreachable!("kms signing is rejected");
        }
        other => bail!("unsupported provider {other}"),
    };

    let bundle = create_bundle(&statement, material)?;
    let out_path = resolve_out_path(args.out, &args.r#in, &statement);
    write_bundle(&out_path, &bundle)?;
    println!("{}", out_path.display());
    Ok(())
}

fn resolve_out_path(
    out: Option<PathBuf>,
    in_path: &Path,
    statement: &serde_json::Value,
) -> PathBuf {
    match out {
        Some(path) if path.is_dir() => path.join(default_bundle_name(statement)),
        Some(path) => path,
        None => in_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(default_bundle_name(statement)),
    }
}

/// Default bundle file name:
/// `attestation_<type>_<git_sha>_<statement_id>.bundle.json`.
fn default_bundle_name(statement: &serde_json::Value) -> String {
    let att_type = str_field(statement, "attestation_type");
    let statement_id = str_field(statement, "statement_id");
    let mut git_sha = statement
        .get("generator")
        .and_then(|g| g.get("git_sha"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned();
    if git_sha.is_empty() {
        git_sha = "local".to_owned();
    }
    let git_sha: String = git_sha
        .chars()
        .map(|c| if matches!(c, '/' | ':' | ' ') { '_' } else { c })
        .collect();
    format!("attestation_{att_type}_{git_sha}_{statement_id}.bundle.json")
}

fn str_field(statement: &serde_json::Value, key: &str) -> String {
    statement
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_owned()
}
