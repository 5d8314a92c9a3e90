//! The `llmsa gate` subcommand.

use std::path::PathBuf;
use std::process;

use clap::Args;
use color_eyre::eyre::{bail, Result};

use llmsa_attest::vcs;
use llmsa_verify::policy::{evaluate, load_policy, load_statements};
use llmsa_verify::report::EXIT_POLICY_FAIL;

/// Arguments for `llmsa gate`.
#[derive(Args)]
pub struct GateArgs {
    /// Policy YAML path.
    #[arg(long, value_name = "PATH")]
    pub policy: PathBuf,

    /// Attestation directory, file, or comma-separated OCI refs.
    #[arg(long, value_name = "PATH", default_value = ".llmsa/attestations")]
    pub attestations: String,

    /// Attestation source type (local|oci).
    #[arg(long, value_name = "SOURCE", default_value = "local")]
    pub source: String,

    /// Policy engine.
    #[arg(long, value_name = "ENGINE", default_value = "yaml")]
    pub engine: String,

    /// Git reference for changed-file triggers.
    #[arg(long, value_name = "REF", default_value = "HEAD~1")]
    pub git_ref: String,
}

/// Execute the gate command.
pub async fn execute(args: GateArgs) -> Result<()> {
    let mut _scratch: Option<tempfile::TempDir> = None;
    let source_path = match args.source.as_str() {
        "local" => PathBuf::from(&args.attestations),
        "oci" => {
            let refs = super::verify::split_csv(&args.attestations);
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

    if args.engine != "yaml" {
        bail!(
            "unsupported policy engine {}: only the yaml engine is built in",
            args.engine
        );
    }

    let policy = load_policy(&args.policy)?;
    let statements = load_statements(&source_path)?;
    let changed = vcs::changed_files(&args.git_ref);

    let violations = evaluate(&policy, &statements, &changed);
    if !violations.is_empty() {
        for violation in &violations {
            println!("{violation}");
        }
        eprintln!("policy gate failed");
        process::exit(EXIT_POLICY_FAIL);
    }
    println!("policy gate passed");
    Ok(())
}
