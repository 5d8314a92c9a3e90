//! The `llmsa verify` subcommand.

use std::path::PathBuf;
use std::process;

use clap::Args;
use color_eyre::eyre::{bail, Result};

use llmsa_verify::engine::{run, Options};
use llmsa_verify::policy::load_policy;
use llmsa_verify::render;
use llmsa_verify::signature::SignerPolicy;

/// Arguments for `llmsa verify`.
#[derive(Args)]
pub struct VerifyArgs {
    /// Source type (local|oci).
    #[arg(long, value_name = "SOURCE", default_value = "local")]
    pub source: String,

    /// Bundle path, directory, or comma-separated OCI refs.
    #[arg(long, value_name = "PATH", default_value = ".llmsa/attestations")]
    pub attestations: String,

    /// Policy YAML supplying the signer policy.
    #[arg(long, value_name = "PATH")]
    pub policy: Option<PathBuf>,

    /// Report format (json|md).
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    pub format: String,

    /// Report output path.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Schema directory.
    #[arg(long, value_name = "DIR", default_value = "schemas/v1")]
    pub schema_dir: PathBuf,
}

/// Execute the verify command.
pub async fn execute(args: VerifyArgs) -> Result<()> {
    let mut signer_policy = SignerPolicy::default();
    if let Some(ref policy_path) = args.policy {
        let policy = load_policy(policy_path)?;
        signer_policy.oidc_issuer = policy.oidc_issuer;
        signer_policy.identity_regex = policy.identity_regex;
    }

    // Keep the scratch dir alive until the engine has run.
    let mut _scratch: Option<tempfile::TempDir> = None;
    let source_path = match args.source.as_str() {
        "local" => PathBuf::from(&args.attestations),
        "oci" => {
            let refs = split_csv(&args.attestations);
            if refs.is_empty() {
                bail!("--attestations must include at least one OCI ref for --source oci");
            }
            let tmp = tempfile::tempdir()?;
            for (i, oci_ref) in refs.iter().enumerate() {
                let out = tmp.path().join(format!("oci_{}.bundle.json", i + 1));
                llmsa_store::oci::pull(oci_ref, &out).await?;
            }
            let path = tmp.path().to_path_buf();
            _scratch = Some(tmp);
            path
        }
        other => bail!("unsupported source {other}"),
    };

    let report = run(&Options {
        source_path,
        schema_dir: args.schema_dir,
        signer_policy,
    });

    let out_path = match args.format.as_str() {
        "json" => {
            let out = args.out.unwrap_or_else(|| PathBuf::from("verify.json"));
            render::write_json(&out, &report)?;
            out
        }
        "md" => {
            let out = args.out.unwrap_or_else(|| PathBuf::from("verify.md"));
            render::write_markdown(&out, &report)?;
            out
        }
        other => bail!("unsupported format {other}"),
    };
    println!("{}", out_path.display());

    if !report.passed {
        eprintln!("verification failed");
        process::exit(report.exit_code);
    }
    Ok(())
}

pub(crate) fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .collect()
}
