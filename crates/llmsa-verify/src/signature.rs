//! Signature verification for bundles.
//!
//! The statement hash binds the payload to the metadata before any
//! cryptographic check runs, so a tampered payload can never produce a
//! more specific error than a signature failure. Certificate-bearing
//! sigstore signatures are delegated to the external `cosign` binary
//! (including its transparency-log checks); everything else is Ed25519
//! verified in-process.

use std::path::Path;
use std::process::Command;

use base64::Engine;
use ed25519_dalek::pkcs8::DecodePublicKey;
use ed25519_dalek::{Signature as EdSignature, Verifier, VerifyingKey};

use llmsa_core::bundle::{Bundle, Signature};
use llmsa_core::canonical::digest_bytes;

use crate::error::VerifyError;

/// Constraints on who may have signed a bundle.
#[derive(Debug, Clone, Default)]
pub struct SignerPolicy {
    /// Required OIDC issuer for sigstore signatures; empty accepts any.
    pub oidc_issuer: String,
    /// Regex the OIDC identity must match; empty accepts any.
    pub identity_regex: String,
}

/// Verify the bundle's signature and signer policy.
pub fn verify_signature(bundle: &Bundle, policy: &SignerPolicy) -> Result<(), VerifyError> {
    if bundle.envelope.signatures.is_empty() {
        return Err(VerifyError::Signature("no signatures in bundle".to_owned()));
    }
    let raw_payload = base64::engine::general_purpose::STANDARD
        .decode(&bundle.envelope.payload)
        .map_err(|e| VerifyError::Signature(format!("decode payload: {e}")))?;
    if digest_bytes(&raw_payload) != bundle.metadata.statement_hash {
        return Err(VerifyError::Signature("statement hash mismatch".to_owned()));
    }

    let sig = &bundle.envelope.signatures[0];
    let certificate = sig
        .certificate_pem
        .as_deref()
        .map(str::trim)
        .unwrap_or_default();
    if sig.provider == "sigstore" && !certificate.is_empty() {
        return verify_with_cosign(&raw_payload, sig, policy);
    }

    let public = parse_public_key(&sig.public_key_pem)?;
    let raw_sig = base64::engine::general_purpose::STANDARD
        .decode(&sig.sig)
        .map_err(|e| VerifyError::Signature(format!("decode signature: {e}")))?;
    let parsed_sig = EdSignature::from_slice(&raw_sig)
        .map_err(|_| VerifyError::Signature("signature verification failed".to_owned()))?;
    public
        .verify(&raw_payload, &parsed_sig)
        .map_err(|_| VerifyError::Signature("signature verification failed".to_owned()))?;

    if sig.provider == "sigstore" {
        verify_identity_policy(sig, policy)?;
    }
    Ok(())
}

/// Hand a certificate-bearing signature to `cosign verify-blob`.
fn verify_with_cosign(
    payload: &[u8],
    sig: &Signature,
    policy: &SignerPolicy,
) -> Result<(), VerifyError> {
    let tmp = tempfile::tempdir()
        .map_err(|e| VerifyError::io("create sigstore verify scratch dir", e))?;
    let payload_path = tmp.path().join("payload.json");
    let sig_path = tmp.path().join("payload.sig");
    let cert_path = tmp.path().join("payload.pem");
    write_file(&payload_path, payload)?;
    write_file(&sig_path, format!("{}\n", sig.sig.trim()).as_bytes())?;
    write_file(
        &cert_path,
        sig.certificate_pem.as_deref().unwrap_or_default().as_bytes(),
    )?;

    let mut cmd = Command::new("cosign");
    cmd.arg("verify-blob")
        .arg("--signature")
        .arg(&sig_path)
        .arg("--certificate")
        .arg(&cert_path);
    if !policy.oidc_issuer.is_empty() {
        cmd.arg("--certificate-oidc-issuer").arg(&policy.oidc_issuer);
    }
    if !policy.identity_regex.is_empty() {
        cmd.arg("--certificate-identity-regexp")
            .arg(&policy.identity_regex);
    }
    cmd.arg(&payload_path);

    let output = cmd.output().map_err(|e| {
        VerifyError::Signature(format!(
            "cosign binary is required to verify sigstore keyless bundles: {e}"
        ))
    })?;
    if !output.status.success() {
        let mut detail = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        if detail.is_empty() {
            detail = String::from_utf8_lossy(&output.stdout).trim().to_owned();
        }
        return Err(VerifyError::Signature(format!(
            "sigstore verification failed (including Rekor/tlog checks): {detail}"
        )));
    }
    Ok(())
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), VerifyError> {
    std::fs::write(path, contents)
        .map_err(|e| VerifyError::io(format!("write {}", path.display()), e))
}

/// Enforce issuer and identity constraints on certificate-less sigstore
/// signatures.
fn verify_identity_policy(sig: &Signature, policy: &SignerPolicy) -> Result<(), VerifyError> {
    if !policy.oidc_issuer.is_empty() {
        let issuer = sig.oidc_issuer.as_deref().unwrap_or_default();
        if issuer != policy.oidc_issuer {
            return Err(VerifyError::Signature(format!(
                "oidc issuer mismatch: got {issuer}"
            )));
        }
    }
    if !policy.identity_regex.is_empty() {
        let re = regex::Regex::new(&policy.identity_regex)
            .map_err(|e| VerifyError::Signature(format!("invalid identity regex: {e}")))?;
        let identity = sig.oidc_identity.as_deref().unwrap_or_default();
        if !re.is_match(identity) {
            return Err(VerifyError::Signature(format!(
                "oidc identity mismatch: {identity}"
            )));
        }
    }
    Ok(())
}

fn parse_public_key(raw_pem: &str) -> Result<VerifyingKey, VerifyError> {
    VerifyingKey::from_public_key_pem(raw_pem.trim())
        .map_err(|_| VerifyError::Signature("invalid public key pem".to_owned()))
}
