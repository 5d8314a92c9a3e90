//! The `llmsa publish` subcommand.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;

/// Arguments for `llmsa publish`.
#[derive(Args)]
pub struct PublishArgs {
    /// Bundle path.
    #[arg(long, value_name = "PATH")]
    pub r#in: PathBuf,

    /// OCI destination reference.
    #[arg(long, value_name = "REF")]
    pub oci: String,
}

/// Execute the publish command.
pub async fn execute(args: PublishArgs) -> Result<()> {
    let pinned = llmsa_store::oci::publish(&args.r#in, &args.oci).await?;
    println!("{pinned}");
    Ok(())
}
