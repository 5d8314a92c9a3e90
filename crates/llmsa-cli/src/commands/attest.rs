//! The `llmsa attest` subcommand.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::{bail, Result};

use llmsa_attest::service::{create_by_type, create_changed_only, CreateOptions};

/// Arguments for `llmsa attest`.
#[derive(Args)]
pub struct AttestArgs {
    #[command(subcommand)]
    pub command: AttestCommands,
}

#[derive(clap::Subcommand)]
pub enum AttestCommands {
    /// Create statement attestation(s).
    Create(CreateArgs),
}

/// Arguments for `llmsa attest create`.
#[derive(Args)]
pub struct CreateArgs {
    /// Attestation type to collect.
    #[arg(long, value_name = "TYPE")]
    pub r#type: Option<String>,

    /// Collector config file.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output directory for statement files.
    #[arg(long, value_name = "DIR", default_value = ".llmsa/attestations")]
    pub out: PathBuf,

    /// Create attestations for kinds matched by changed files.
    #[arg(long)]
    pub changed_only: bool,

    /// Git reference for --changed-only.
    #[arg(long, value_name = "REF", default_value = "HEAD~1")]
    pub git_ref: String,

    /// Run collection N times and require identical canonical hashes.
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub determinism_check: u32,
}

/// Execute the attest command.
pub fn execute(args: AttestArgs) -> Result<()> {
    let AttestCommands::Create(create) = args.command;

    let files = if create.changed_only {
        create_changed_only(&create.git_ref, &create.out, create.determinism_check)?
    } else {
        let (Some(att_type), Some(config)) = (create.r#type, create.config) else {
            bail!("--type and --config are required when --changed-only is false");
        };
        create_by_type(&CreateOptions {
            attestation_type: att_type,
            config_path: config,
            out_dir: create.out,
            determinism_check: create.determinism_check,
        })?
    };

    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}
