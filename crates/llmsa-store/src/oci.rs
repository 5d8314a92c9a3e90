//! OCI push and pull of bundle artifacts.
//!
//! A bundle is stored as a single-layer OCI image whose layer bytes are
//! exactly the bundle file bytes, under a fixed media type. Push returns
//! the pinned digest reference so callers can record immutable locations.

use std::path::Path;

use oci_distribution::client::{Client, ClientConfig, Config, ImageLayer};
use oci_distribution::manifest::OciImageManifest;
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::Reference;

use crate::error::StoreError;

/// Layer media type for bundle artifacts. A stability contract.
pub const BUNDLE_MEDIA_TYPE: &str = "application/vnd.llmsa.bundle.v1+json";

const OCI_CONFIG_MEDIA_TYPE: &str = "application/vnd.oci.image.config.v1+json";

/// Registry assumed when a reference names no host.
pub const DEFAULT_REGISTRY: &str = "ghcr.io";

/// Push a bundle file as a single-layer artifact.
///
/// Returns the pinned `<registry>/<repository>@sha256:<hex>` reference.
pub async fn publish(in_path: &Path, oci_ref: &str) -> Result<String, StoreError> {
    let raw = std::fs::read(in_path)
        .map_err(|e| StoreError::io(format!("read bundle {}", in_path.display()), e))?;
    let reference = parse_reference(oci_ref)?;

    let layers = vec![ImageLayer::new(raw, BUNDLE_MEDIA_TYPE.to_owned(), None)];
    let config = Config::new(b"{}".to_vec(), OCI_CONFIG_MEDIA_TYPE.to_owned(), None);
    let manifest = OciImageManifest::build(&layers, &config, None);

    let mut client = Client::new(ClientConfig::default());
    client
        .push(
            &reference,
            &layers,
            config,
            &RegistryAuth::Anonymous,
            Some(manifest),
        )
        .await
        .map_err(|e| StoreError::Registry {
            context: "push oci artifact".to_owned(),
            detail: e.to_string(),
        })?;

    let digest = client
        .fetch_manifest_digest(&reference, &RegistryAuth::Anonymous)
        .await
        .map_err(|e| StoreError::Registry {
            context: "resolve pushed digest".to_owned(),
            detail: e.to_string(),
        })?;
    let pinned = format!("{}/{}@{}", reference.registry(), reference.repository(), digest);
    tracing::info!(reference = %pinned, "pushed bundle artifact");
    Ok(pinned)
}

/// Pull a bundle artifact and write the first layer verbatim to
/// `out_path`.
pub async fn pull(oci_ref: &str, out_path: &Path) -> Result<(), StoreError> {
    let reference = parse_reference(oci_ref)?;
    let mut client = Client::new(ClientConfig::default());
    let image = client
        .pull(&reference, &RegistryAuth::Anonymous, vec![BUNDLE_MEDIA_TYPE])
        .await
        .map_err(|e| StoreError::Registry {
            context: "pull oci artifact".to_owned(),
            detail: e.to_string(),
        })?;

    let layer = image.layers.first().ok_or(StoreError::EmptyArtifact)?;
    std::fs::write(out_path, &layer.data)
        .map_err(|e| StoreError::io(format!("write pulled bundle {}", out_path.display()), e))?;
    Ok(())
}

/// Parse a reference, defaulting the registry to [`DEFAULT_REGISTRY`]
/// when the first path component is not a host.
pub fn parse_reference(oci_ref: &str) -> Result<Reference, StoreError> {
    let normalized = normalize_reference(oci_ref);
    normalized
        .parse::<Reference>()
        .map_err(|e| StoreError::InvalidReference {
            reference: oci_ref.to_owned(),
            detail: e.to_string(),
        })
}

fn normalize_reference(oci_ref: &str) -> String {
    let first = oci_ref.split('/').next().unwrap_or_default();
    let is_host = first.contains('.') || first.contains(':') || first == "localhost";
    if is_host {
        oci_ref.to_owned()
    } else {
        format!("{DEFAULT_REGISTRY}/{oci_ref}")
    }
}
