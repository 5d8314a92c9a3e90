//! The signed envelope/bundle wire format.
//!
//! A bundle binds the canonical statement bytes (base64 in the envelope
//! payload), the signature material, and a metadata block carrying the
//! statement hash. Bundles are read-only once written; the `payloadType`
//! string and `bundle_version` are stability contracts.

use std::path::Path;

use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::canonical;
use crate::error::CoreError;
use crate::signer::SignMaterial;

/// Media type of the envelope payload.
pub const PAYLOAD_TYPE: &str = "application/vnd.llmsa.statement.v1+json";

/// Current bundle format version.
pub const BUNDLE_VERSION: &str = "1";

/// A signed attestation bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    /// The signed envelope.
    pub envelope: Envelope,
    /// Bundle metadata.
    pub metadata: BundleMetadata,
}

/// The envelope wrapping the canonical statement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Always [`PAYLOAD_TYPE`].
    #[serde(rename = "payloadType")]
    pub payload_type: String,
    /// Base64 of the canonical statement bytes.
    pub payload: String,
    /// Signatures over the payload bytes.
    pub signatures: Vec<Signature>,
}

/// One signature over the envelope payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signature {
    /// Short identifier for the signing key.
    pub keyid: String,
    /// Base64 signature bytes.
    pub sig: String,
    /// Signing provider: `pem`, `sigstore`, or `kms`.
    pub provider: String,
    /// PEM-encoded PKIX public key; empty for certificate-only signatures.
    pub public_key_pem: String,
    /// Short-lived X.509 identity certificate (keyless signing).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_pem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oidc_identity: Option<String>,
}

/// Bundle metadata block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// Always [`BUNDLE_VERSION`].
    pub bundle_version: String,
    /// RFC3339 UTC creation time of the bundle.
    pub created_at: String,
    /// `sha256:<hex>` of the canonical statement bytes.
    pub statement_hash: String,
}

/// Canonicalize a statement and wrap it with the given signature material.
pub fn create_bundle<T: Serialize>(
    statement: &T,
    material: SignMaterial,
) -> Result<Bundle, CoreError> {
    let (statement_hash, canonical_bytes) = canonical::hash_canonical_json(statement)?;

    Ok(Bundle {
        envelope: Envelope {
            payload_type: PAYLOAD_TYPE.to_owned(),
            payload: base64::engine::general_purpose::STANDARD.encode(&canonical_bytes),
            signatures: vec![Signature {
                keyid: material.key_id,
                sig: material.sig_b64,
                provider: material.provider,
                public_key_pem: material.public_key_pem,
                certificate_pem: material.certificate_pem,
                oidc_issuer: material.oidc_issuer,
                oidc_identity: material.oidc_identity,
            }],
        },
        metadata: BundleMetadata {
            bundle_version: BUNDLE_VERSION.to_owned(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            statement_hash,
        },
    })
}

/// Decode the envelope payload into a statement value.
pub fn decode_payload<T: DeserializeOwned>(bundle: &Bundle) -> Result<T, CoreError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(&bundle.envelope.payload)
        .map_err(|e| CoreError::InvalidBundle(format!("decode bundle payload: {e}")))?;
    serde_json::from_slice(&raw)
        .map_err(|e| CoreError::InvalidBundle(format!("unmarshal bundle payload: {e}")))
}

/// Write a bundle as pretty-printed JSON.
pub fn write_bundle(path: &Path, bundle: &Bundle) -> Result<(), CoreError> {
    let raw = serde_json::to_vec_pretty(bundle)?;
    std::fs::write(path, raw)
        .map_err(|e| CoreError::io(format!("write bundle {}", path.display()), e))
}

/// Read a bundle from disk.
pub fn read_bundle(path: &Path) -> Result<Bundle, CoreError> {
    let raw = std::fs::read(path)
        .map_err(|e| CoreError::io(format!("read bundle {}", path.display()), e))?;
    serde_json::from_slice(&raw)
        .map_err(|e| CoreError::InvalidBundle(format!("parse bundle {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn material() -> SignMaterial {
        SignMaterial {
            key_id: "abcd1234".to_owned(),
            sig_b64: "c2ln".to_owned(),
            provider: "pem".to_owned(),
            public_key_pem: "-----BEGIN PUBLIC KEY-----\n-----END PUBLIC KEY-----\n".to_owned(),
            certificate_pem: None,
            oidc_issuer: None,
            oidc_identity: None,
        }
    }

    #[test]
    fn statement_hash_binds_payload() {
        let statement = serde_json::json!({"b": 2, "a": 1});
        let bundle = create_bundle(&statement, material()).expect("bundle");

        let raw = base64::engine::general_purpose::STANDARD
            .decode(&bundle.envelope.payload)
            .expect("decode");
        assert_eq!(raw, br#"{"a":1,"b":2}"#.to_vec());
        assert_eq!(
            bundle.metadata.statement_hash,
            crate::canonical::digest_bytes(&raw)
        );
        assert_eq!(bundle.envelope.payload_type, PAYLOAD_TYPE);
        assert_eq!(bundle.metadata.bundle_version, BUNDLE_VERSION);
    }

    #[test]
    fn write_read_round_trip() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("a.bundle.json");

        let statement = serde_json::json!({"attestation_type": "prompt_attestation"});
        let bundle = create_bundle(&statement, material()).expect("bundle");
        write_bundle(&path, &bundle).expect("write");

        let reread = read_bundle(&path).expect("read");
        assert_eq!(reread.envelope.payload, bundle.envelope.payload);
        assert_eq!(
            reread.metadata.statement_hash,
            bundle.metadata.statement_hash
        );
        assert_eq!(reread.metadata.created_at, bundle.metadata.created_at);
    }

    #[test]
    fn decode_payload_recovers_statement() {
        let statement = serde_json::json!({"attestation_type": "slo_attestation", "n": 3});
        let bundle = create_bundle(&statement, material()).expect("bundle");

        let decoded: serde_json::Value = decode_payload(&bundle).expect("decode");
        assert_eq!(decoded["attestation_type"], "slo_attestation");
        assert_eq!(decoded["n"], serde_json::json!(3));
    }

    #[test]
    fn decode_rejects_bad_base64() {
        let statement = serde_json::json!({});
        let mut bundle = create_bundle(&statement, material()).expect("bundle");
        bundle.envelope.payload = "!!!not base64!!!".to_owned();

        let result: Result<serde_json::Value, _> = decode_payload(&bundle);
        assert!(matches!(result, Err(CoreError::InvalidBundle(_))));
    }

    #[test]
    fn optional_signature_fields_omitted_on_wire() {
        let statement = serde_json::json!({});
        let bundle = create_bundle(&statement, material()).expect("bundle");
        let raw = serde_json::to_string(&bundle).expect("serialize");
        assert!(!raw.contains("certificate_pem"));
        assert!(!raw.contains("oidc_issuer"));
    }
}
