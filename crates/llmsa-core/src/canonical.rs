//! Canonical JSON serialization.
//!
//! Two semantically equal JSON documents (same keys and values, any key
//! order) canonicalize to byte-identical output. Object keys are sorted
//! bytewise, there is no whitespace, and numeric tokens are preserved from
//! the input source where available (the `arbitrary_precision` feature of
//! `serde_json` keeps the original text of parsed numbers). Every digest in
//! the system is computed over these bytes, so the rules here are a wire
//! contract: any change invalidates every existing bundle.

use std::io::Write;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Serialize a value to canonical JSON bytes.
///
/// The value is first normalized through `serde_json::Value`, then written
/// with sorted keys and no whitespace. Canonicalization is idempotent:
/// re-parsing and re-encoding the output yields the same bytes.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<Vec<u8>, CoreError> {
    let normalized = serde_json::to_value(value)?;
    let mut out = Vec::new();
    write_canonical(&mut out, &normalized)?;
    Ok(out)
}

/// Canonicalize a value and return its digest together with the bytes.
///
/// The digest is the `sha256:<hex>` form used throughout the bundle format.
pub fn hash_canonical_json<T: Serialize>(value: &T) -> Result<(String, Vec<u8>), CoreError> {
    let canonical = canonical_json(value)?;
    Ok((digest_bytes(&canonical), canonical))
}

/// SHA-256 of a byte slice in `sha256:<hex>` form.
pub fn digest_bytes(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Strip the `sha256:` prefix from a digest string, if present.
pub fn bare_hex(digest: &str) -> &str {
    digest.strip_prefix("sha256:").unwrap_or(digest)
}

fn write_canonical(out: &mut Vec<u8>, value: &serde_json::Value) -> Result<(), CoreError> {
    match value {
        serde_json::Value::Null => {
            out.extend_from_slice(b"null");
            Ok(())
        }
        serde_json::Value::Bool(b) => {
            out.extend_from_slice(if *b { b"true" } else { b"false" });
            Ok(())
        }
        serde_json::Value::String(s) => write_json_string(out, s),
        serde_json::Value::Number(n) => write_number(out, &n.to_string()),
        serde_json::Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(out, item)?;
            }
            out.push(b']');
            Ok(())
        }
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_json_string(out, key)?;
                out.push(b':');
                write_canonical(out, &map[key.as_str()])?;
            }
            out.push(b'}');
            Ok(())
        }
    }
}

fn write_json_string(out: &mut Vec<u8>, s: &str) -> Result<(), CoreError> {
    serde_json::to_writer(&mut *out, s)?;
    Ok(())
}

/// Write a numeric token, rejecting values that do not fit a finite f64.
///
/// The token itself is emitted verbatim so source formatting survives;
/// the parse only guards against infinities and malformed input.
fn write_number(out: &mut Vec<u8>, token: &str) -> Result<(), CoreError> {
    match token.parse::<f64>() {
        Ok(f) if f.is_finite() => {
            out.write_all(token.as_bytes())
                .map_err(|e| CoreError::io("write canonical number", e))?;
            Ok(())
        }
        _ => Err(CoreError::InvalidNumber(token.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon(raw: &str) -> Vec<u8> {
        let value: serde_json::Value = serde_json::from_str(raw).expect("parse");
        canonical_json(&value).expect("canonicalize")
    }

    #[test]
    fn key_order_is_normalized() {
        assert_eq!(canon(r#"{"b":2,"a":1}"#), canon(r#"{"a":1,"b":2}"#));
        assert_eq!(canon(r#"{"b":2,"a":1}"#), br#"{"a":1,"b":2}"#.to_vec());
    }

    #[test]
    fn idempotent() {
        let first = canon(r#"{"z":{"y":[3,2,1],"x":null},"a":true}"#);
        let second = canon(std::str::from_utf8(&first).unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn arrays_preserve_order() {
        assert_eq!(canon("[3,1,2]"), b"[3,1,2]".to_vec());
    }

    #[test]
    fn whitespace_is_removed() {
        assert_eq!(
            canon("{ \"a\" : [ 1 , 2 ] }"),
            br#"{"a":[1,2]}"#.to_vec()
        );
    }

    #[test]
    fn numeric_tokens_survive() {
        // 1.50 must not collapse to 1.5 — the digest depends on it.
        assert_eq!(canon(r#"{"v":1.50}"#), br#"{"v":1.50}"#.to_vec());
        assert_eq!(canon(r#"{"v":1e3}"#), br#"{"v":1e3}"#.to_vec());
    }

    #[test]
    fn overflowing_number_is_rejected() {
        let value: serde_json::Value = serde_json::from_str(r#"{"v":1e999}"#).expect("parse");
        assert!(matches!(
            canonical_json(&value),
            Err(CoreError::InvalidNumber(_))
        ));
    }

    #[test]
    fn hash_matches_bytes() {
        let value = serde_json::json!({"a": 1});
        let (digest, bytes) = hash_canonical_json(&value).expect("hash");
        assert_eq!(digest, digest_bytes(&bytes));
        assert!(digest.starts_with("sha256:"));
        assert_eq!(digest.len(), "sha256:".len() + 64);
    }

    #[test]
    fn digest_of_empty_bytes() {
        assert_eq!(
            digest_bytes(b""),
            "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn bare_hex_strips_prefix() {
        assert_eq!(bare_hex("sha256:abc"), "abc");
        assert_eq!(bare_hex("abc"), "abc");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_json() -> impl Strategy<Value = serde_json::Value> {
            let leaf = prop_oneof![
                Just(serde_json::Value::Null),
                any::<bool>().prop_map(serde_json::Value::from),
                any::<i64>().prop_map(serde_json::Value::from),
                "[a-z0-9 ]{0,12}".prop_map(serde_json::Value::from),
            ];
            leaf.prop_recursive(3, 24, 4, |inner| {
                prop_oneof![
                    prop::collection::vec(inner.clone(), 0..4)
                        .prop_map(serde_json::Value::Array),
                    prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|m| {
                        serde_json::Value::Object(m.into_iter().collect())
                    }),
                ]
            })
        }

        proptest! {
            /// canonical(canonical(x)) == canonical(x).
            #[test]
            fn canonicalization_is_idempotent(value in arb_json()) {
                let first = canonical_json(&value).unwrap();
                let reparsed: serde_json::Value =
                    serde_json::from_slice(&first).unwrap();
                let second = canonical_json(&reparsed).unwrap();
                prop_assert_eq!(first, second);
            }

            /// Output never contains insignificant whitespace.
            #[test]
            fn no_stray_whitespace(value in arb_json()) {
                let bytes = canonical_json(&value).unwrap();
                let reparsed: serde_json::Value =
                    serde_json::from_slice(&bytes).unwrap();
                let compact = serde_json::to_string(&reparsed).unwrap();
                prop_assert_eq!(bytes.len(), compact.len());
            }
        }
    }
}
