//! Privacy-mode post-processing.
//!
//! Every collector config may carry a `privacy_mode`. In
//! `encrypted_payload` mode the statement stores only metadata: a digest
//! deterministically bound to the source bytes and the recipient material,
//! and a recipient fingerprint. Plaintext never enters the statement.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use llmsa_core::canonical::{bare_hex, digest_bytes};
use llmsa_core::statement::{Privacy, PrivacyMode, Statement};

use crate::config::{load_config, resolve_path};
use crate::error::AttestError;

/// The privacy-related subset of a collector config.
#[derive(Debug, Default, Deserialize)]
pub struct PrivacyConfig {
    #[serde(default)]
    pub privacy_mode: String,
    #[serde(default)]
    pub encrypted_payload_path: String,
    #[serde(default)]
    pub age_recipient: String,
    #[serde(default)]
    pub encryption_recipient_fingerprint: String,
}

/// Apply the privacy settings from a collector config to a statement.
pub fn apply_privacy(statement: &mut Statement, config_path: &Path) -> Result<(), AttestError> {
    let cfg: PrivacyConfig = load_config(config_path)?;

    let mode = cfg.privacy_mode.trim();
    match mode {
        "" | "hash_only" => {
            statement.privacy = Privacy::hash_only();
            Ok(())
        }
        "plaintext_explicit" => {
            statement.privacy = Privacy {
                mode: PrivacyMode::PlaintextExplicit,
                encrypted_blob_digest: None,
                encryption_recipient_fingerprint: None,
            };
            Ok(())
        }
        "encrypted_payload" => {
            let payload_path = resolve_path(config_path, &cfg.encrypted_payload_path);
            if payload_path.is_empty() {
                return Err(AttestError::Invalid(
                    "encrypted_payload requires encrypted_payload_path in collector config"
                        .to_owned(),
                ));
            }
            if cfg.age_recipient.is_empty() {
                return Err(AttestError::Invalid(
                    "encrypted_payload requires age_recipient in collector config".to_owned(),
                ));
            }
            age::x25519::Recipient::from_str(&cfg.age_recipient)
                .map_err(|e| AttestError::InvalidRecipient(e.to_owned()))?;
            let raw = std::fs::read(&payload_path).map_err(|e| {
                AttestError::io(format!("read encrypted payload source {payload_path}"), e)
            })?;

            // Digest is bound to source bytes and recipient material, never
            // to plaintext content reachable from the statement.
            let mut scope = format!("age:x25519:{}\n", cfg.age_recipient).into_bytes();
            scope.extend_from_slice(&raw);
            let blob_digest = digest_bytes(&scope);

            let fingerprint = if cfg.encryption_recipient_fingerprint.trim().is_empty() {
                bare_hex(&digest_bytes(cfg.age_recipient.as_bytes())).to_owned()
            } else {
                cfg.encryption_recipient_fingerprint.trim().to_owned()
            };

            statement.privacy = Privacy {
                mode: PrivacyMode::EncryptedPayload,
                encrypted_blob_digest: Some(blob_digest),
                encryption_recipient_fingerprint: Some(fingerprint),
            };
            Ok(())
        }
        other => Err(AttestError::UnsupportedPrivacyMode(other.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmsa_core::statement::{AttestationKind, Predicate, SloPredicate, TimeWindow};

    fn test_statement() -> Statement {
        crate::statement::new_statement(
            AttestationKind::Slo,
            Predicate::Slo(SloPredicate {
                slo_profile_id: "p".to_owned(),
                window: TimeWindow {
                    start: "2025-07-01T00:00:00Z".to_owned(),
                    end: "2025-07-02T00:00:00Z".to_owned(),
                },
                ttft_ms_p50: 1.0,
                ttft_ms_p95: 2.0,
                tokens_per_sec_p50: 3.0,
                cost_per_1k_tokens_cap_usd: 4.0,
                error_rate_cap: 0.5,
                error_budget_remaining: 0.6,
                observability_query_digest: None,
            }),
            vec![],
            vec![],
        )
    }

    fn recipient() -> String {
        age::x25519::Identity::generate().to_public().to_string()
    }

    #[test]
    fn default_mode_is_hash_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = tmp.path().join("slo.yaml");
        std::fs::write(&config, "slo_profile_id: p\n").expect("write");

        let mut st = test_statement();
        apply_privacy(&mut st, &config).expect("apply");
        assert_eq!(st.privacy.mode, PrivacyMode::HashOnly);
        assert!(st.privacy.encrypted_blob_digest.is_none());
    }

    #[test]
    fn plaintext_explicit_carries_no_extra_fields() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = tmp.path().join("slo.yaml");
        std::fs::write(&config, "privacy_mode: plaintext_explicit\n").expect("write");

        let mut st = test_statement();
        apply_privacy(&mut st, &config).expect("apply");
        assert_eq!(st.privacy.mode, PrivacyMode::PlaintextExplicit);
        assert!(st.privacy.encrypted_blob_digest.is_none());
    }

    #[test]
    fn encrypted_payload_stores_metadata_only() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let payload = tmp.path().join("secret.txt");
        std::fs::write(&payload, b"raw payload bytes").expect("write");
        let recipient = recipient();

        let config = tmp.path().join("slo.yaml");
        std::fs::write(
            &config,
            format!(
                "privacy_mode: encrypted_payload\nencrypted_payload_path: {}\nage_recipient: {recipient}\n",
                payload.display()
            ),
        )
        .expect("write");

        let mut st = test_statement();
        apply_privacy(&mut st, &config).expect("apply");
        assert_eq!(st.privacy.mode, PrivacyMode::EncryptedPayload);

        let mut scope = format!("age:x25519:{recipient}\n").into_bytes();
        scope.extend_from_slice(b"raw payload bytes");
        assert_eq!(
            st.privacy.encrypted_blob_digest.as_deref(),
            Some(digest_bytes(&scope).as_str())
        );
        assert_eq!(
            st.privacy.encryption_recipient_fingerprint.as_deref(),
            Some(bare_hex(&digest_bytes(recipient.as_bytes())))
        );

        // The statement must never contain the plaintext.
        let serialized = serde_json::to_string(&st).expect("serialize");
        assert!(!serialized.contains("raw payload bytes"));
    }

    #[test]
    fn provided_fingerprint_wins() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let payload = tmp.path().join("secret.txt");
        std::fs::write(&payload, b"x").expect("write");

        let config = tmp.path().join("slo.yaml");
        std::fs::write(
            &config,
            format!(
                "privacy_mode: encrypted_payload\nencrypted_payload_path: {}\nage_recipient: {}\nencryption_recipient_fingerprint: team-alpha\n",
                payload.display(),
                recipient()
            ),
        )
        .expect("write");

        let mut st = test_statement();
        apply_privacy(&mut st, &config).expect("apply");
        assert_eq!(
            st.privacy.encryption_recipient_fingerprint.as_deref(),
            Some("team-alpha")
        );
    }

    #[test]
    fn malformed_recipient_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let payload = tmp.path().join("secret.txt");
        std::fs::write(&payload, b"x").expect("write");

        let config = tmp.path().join("slo.yaml");
        std::fs::write(
            &config,
            format!(
                "privacy_mode: encrypted_payload\nencrypted_payload_path: {}\nage_recipient: not-a-recipient\n",
                payload.display()
            ),
        )
        .expect("write");

        let mut st = test_statement();
        let err = apply_privacy(&mut st, &config).unwrap_err();
        assert!(matches!(err, AttestError::InvalidRecipient(_)));
    }

    #[test]
    fn unknown_mode_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let config = tmp.path().join("slo.yaml");
        std::fs::write(&config, "privacy_mode: shout_it_loud\n").expect("write");

        let mut st = test_statement();
        let err = apply_privacy(&mut st, &config).unwrap_err();
        assert!(matches!(err, AttestError::UnsupportedPrivacyMode(_)));
    }
}
