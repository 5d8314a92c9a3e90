//! Image-ref collection and attestation-reference derivation.

use sha2::{Digest, Sha256};

use crate::error::WebhookError;
use crate::review::PodSpec;

/// A container image reference extracted from a pod spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    /// Container name, used in violation messages.
    pub container: String,
    /// The image reference as admitted.
    pub image: String,
}

/// Collect image refs from init, regular, and ephemeral containers.
pub fn extract_image_refs(spec: &PodSpec) -> Vec<ImageRef> {
    let mut refs =
        Vec::with_capacity(spec.init_containers.len() + spec.containers.len());
    for c in spec
        .init_containers
        .iter()
        .chain(spec.containers.iter())
        .chain(spec.ephemeral_containers.iter())
    {
        refs.push(ImageRef {
            container: c.name.clone(),
            image: c.image.clone(),
        });
    }
    refs
}

/// Derive the OCI reference where an image's attestation bundle lives.
///
/// Digest-pinned images use `sha256-<hex>` as the tag; everything else
/// gets `img-` plus the first 8 bytes of the SHA-256 of the full
/// reference, hex encoded.
pub fn attestation_ref(registry_prefix: &str, image_ref: &str) -> Result<String, WebhookError> {
    if registry_prefix.is_empty() {
        return Err(WebhookError::InvalidReference(
            "registry prefix is required".to_owned(),
        ));
    }
    let tag = sanitize_image_tag(image_ref);
    if tag.is_empty() {
        return Err(WebhookError::InvalidReference(format!(
            "cannot derive attestation tag from image ref {image_ref:?}"
        )));
    }
    Ok(format!("{}:{tag}", registry_prefix.trim_end_matches('/')))
}

fn sanitize_image_tag(image_ref: &str) -> String {
    if let Some(idx) = image_ref.rfind("@sha256:") {
        let digest = &image_ref[idx + 1..];
        return digest.replace(':', "-");
    }
    let hash = Sha256::digest(image_ref.as_bytes());
    format!("img-{}", hex::encode(&hash[..8]))
}
