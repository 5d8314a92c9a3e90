//! The `llmsa report` subcommand.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;

use llmsa_verify::render::write_markdown;
use llmsa_verify::report::Report;

/// Arguments for `llmsa report`.
#[derive(Args)]
pub struct ReportArgs {
    /// Verify report JSON input.
    #[arg(long, value_name = "PATH")]
    pub r#in: PathBuf,

    /// Markdown output path.
    #[arg(long, value_name = "PATH")]
    pub out: PathBuf,
}

/// Execute the report command.
pub fn execute(args: &ReportArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.r#in)?;
    let report: Report = serde_json::from_str(&raw)?;
    write_markdown(&args.out, &report)?;
    println!("{}", args.out.display());
    Ok(())
}
