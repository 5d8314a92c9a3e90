//! The `llmsa webhook` subcommand.

use std::path::PathBuf;

use clap::Args;
use color_eyre::eyre::Result;

use llmsa_webhook::config::WebhookConfig;
use llmsa_webhook::server;

/// Arguments for `llmsa webhook`.
#[derive(Args)]
pub struct WebhookArgs {
    #[command(subcommand)]
    pub command: WebhookCommands,
}

#[derive(clap::Subcommand)]
pub enum WebhookCommands {
    /// Start the validating admission webhook server.
    Serve(ServeArgs),
}

/// Arguments for `llmsa webhook serve`.
#[derive(Args)]
pub struct ServeArgs {
    /// Webhook listen port.
    #[arg(long, value_name = "PORT", default_value_t = 8443)]
    pub port: u16,

    /// TLS certificate path.
    #[arg(long, value_name = "PATH")]
    pub tls_cert: Option<PathBuf>,

    /// TLS key path.
    #[arg(long, value_name = "PATH")]
    pub tls_key: Option<PathBuf>,

    /// Policy YAML path.
    #[arg(long, value_name = "PATH")]
    pub policy: Option<PathBuf>,

    /// Schema directory.
    #[arg(long, value_name = "DIR", default_value = "schemas/v1")]
    pub schema_dir: PathBuf,

    /// OCI registry prefix for attestation bundles.
    #[arg(long, value_name = "PREFIX", default_value = "")]
    pub registry_prefix: String,

    /// Allow pods when verification encounters an error.
    #[arg(long)]
    pub fail_open: bool,

    /// Successful verification cache TTL in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 300)]
    pub cache_ttl_seconds: i64,
}

/// Execute the webhook command.
pub async fn execute(args: WebhookArgs) -> Result<()> {
    let WebhookCommands::Serve(serve) = args.command;
    let cfg = WebhookConfig {
        port: serve.port,
        tls_cert_path: serve.tls_cert,
        tls_key_path: serve.tls_key,
        policy_path: serve.policy,
        schema_dir: serve.schema_dir,
        registry_prefix: serve.registry_prefix,
        fail_open: serve.fail_open,
        cache_ttl_seconds: serve.cache_ttl_seconds,
        ..WebhookConfig::default()
    };
    server::serve(cfg).await?;
    Ok(())
}
