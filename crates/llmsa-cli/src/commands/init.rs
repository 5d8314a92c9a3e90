//! The `llmsa init` subcommand.

use std::path::Path;

use color_eyre::eyre::Result;

use llmsa_core::digest::file_exists;
use llmsa_core::signer::generate_pem_private_key;
use llmsa_store::local::ensure_default_attestation_dir;

use crate::embedded;

/// Create the default config, starter policy, schema documents, local
/// store, and a development signing key. Existing files are left alone.
pub fn execute() -> Result<()> {
    ensure_default_attestation_dir()?;

    if !file_exists(Path::new("llmsa.yaml")) {
        std::fs::write("llmsa.yaml", embedded::DEFAULT_CONFIG_YAML)?;
    }

    if !file_exists(Path::new("policy/examples/mvp-gates.yaml")) {
        std::fs::create_dir_all("policy/examples")?;
        std::fs::write("policy/examples/mvp-gates.yaml", embedded::DEFAULT_POLICY_YAML)?;
    }

    std::fs::create_dir_all("schemas/v1")?;
    for (name, contents) in embedded::SCHEMAS {
        let path = Path::new("schemas/v1").join(name);
        if !file_exists(&path) {
            std::fs::write(&path, contents)?;
        }
    }

    if !file_exists(Path::new(".llmsa/dev_ed25519.pem")) {
        std::fs::create_dir_all(".llmsa")?;
        generate_pem_private_key(Path::new(".llmsa/dev_ed25519.pem"))?;
    }

    println!("initialized llmsa config, policy, schemas, and local key");
    Ok(())
}
