//! llmsa — LLM supply-chain attestation CLI.
//!
//! Create, sign, publish, and verify content-addressed attestations for
//! generative-AI applications, run policy gates over them, and serve the
//! admission webhook that enforces them cluster-side.

mod commands;
mod embedded;

use clap::Parser;
use color_eyre::eyre::Result;

/// LLM supply-chain attestation: typed provenance statements, signed
/// bundles, and an admission webhook that refuses unattested images.
#[derive(Parser)]
#[command(name = "llmsa", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (repeat for more detail: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output logs as JSON (for machine consumption).
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Initialize llmsa configuration, schemas, and a local dev key.
    Init,
    /// Create attestation statements from collector configs.
    Attest(commands::attest::AttestArgs),
    /// Sign a statement and emit a bundle.
    Sign(commands::sign::SignArgs),
    /// Publish a bundle to an OCI registry.
    Publish(commands::publish::PublishArgs),
    /// Verify bundle signatures, schemas, digests, and the chain.
    Verify(commands::verify::VerifyArgs),
    /// Run policy gates and return non-zero on violations.
    Gate(commands::gate::GateArgs),
    /// Render a verification report as Markdown.
    Report(commands::report::ReportArgs),
    /// Kubernetes admission webhook.
    Webhook(commands::webhook::WebhookArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Attest(args) => commands::attest::execute(args),
        Commands::Sign(args) => commands::sign::execute(args),
        Commands::Publish(args) => commands::publish::execute(args).await,
        Commands::Verify(args) => commands::verify::execute(args).await,
        Commands::Gate(args) => commands::gate::execute(args).await,
        Commands::Report(args) => commands::report::execute(&args),
        Commands::Webhook(args) => commands::webhook::execute(args).await,
    }
}
