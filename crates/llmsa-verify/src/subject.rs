//! Subject re-digest verification.
//!
//! Every subject's `uri` must exist on disk and re-digest to the recorded
//! bare-hex value. Directories are digested as tree manifests.

use std::path::Path;

use llmsa_core::canonical::bare_hex;
use llmsa_core::digest::{digest_file, digest_tree, file_exists};

use crate::error::VerifyError;

/// Re-digest every subject of a decoded statement.
pub fn verify_subjects(statement: &serde_json::Value) -> Result<(), VerifyError> {
    let subjects = statement
        .get("subject")
        .and_then(|s| s.as_array())
        .ok_or_else(|| VerifyError::Subject("statement subject must be array".to_owned()))?;

    for item in subjects {
        let entry = item
            .as_object()
            .ok_or_else(|| VerifyError::Subject("invalid subject entry".to_owned()))?;
        let uri = entry.get("uri").and_then(|v| v.as_str()).unwrap_or_default();
        let expected = entry
            .get("digest")
            .and_then(|d| d.get("sha256"))
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if uri.is_empty() || expected.is_empty() {
            return Err(VerifyError::Subject("subject missing uri/digest".to_owned()));
        }

        let path = Path::new(uri);
        if !file_exists(path) {
            return Err(VerifyError::Subject(format!("subject path missing: {uri}")));
        }

        let actual = if path.is_dir() {
            digest_tree(path)
                .map_err(|e| VerifyError::Subject(format!("cannot digest subject {uri}: {e}")))?
                .digest
        } else {
            digest_file(path)
                .map_err(|e| VerifyError::Subject(format!("cannot digest subject {uri}: {e}")))?
                .0
        };
        if bare_hex(&actual) != expected {
            return Err(VerifyError::Subject(format!(
                "subject digest mismatch for {uri}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use llmsa_core::canonical::digest_bytes;

    fn subject_json(uri: &str, sha256: &str) -> serde_json::Value {
        serde_json::json!({
            "subject": [
                { "name": "s", "uri": uri, "digest": { "sha256": sha256 }, "size_bytes": 0 }
            ]
        })
    }

    #[test]
    fn matching_file_digest_passes() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("subject.txt");
        std::fs::write(&path, b"subject-bytes").expect("write");

        let expected = bare_hex(&digest_bytes(b"subject-bytes")).to_owned();
        let statement = subject_json(path.to_str().unwrap(), &expected);
        verify_subjects(&statement).expect("verify");
    }

    #[test]
    fn rewritten_file_is_a_mismatch() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("subject.txt");
        std::fs::write(&path, b"subject-bytes").expect("write");
        let expected = bare_hex(&digest_bytes(b"subject-bytes")).to_owned();

        std::fs::write(&path, b"tampered").expect("rewrite");
        let statement = subject_json(path.to_str().unwrap(), &expected);
        let err = verify_subjects(&statement).unwrap_err();
        assert!(err.to_string().contains("subject digest mismatch"));
    }

    #[test]
    fn directory_subject_uses_tree_digest() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("tree");
        std::fs::create_dir(&dir).expect("mkdir");
        std::fs::write(dir.join("f.txt"), b"x").expect("write");

        let tree = digest_tree(&dir).expect("tree");
        let statement = subject_json(dir.to_str().unwrap(), bare_hex(&tree.digest));
        verify_subjects(&statement).expect("verify");
    }

    #[test]
    fn missing_path_is_reported() {
        let statement = subject_json("/nonexistent/llmsa-subject", "00");
        let err = verify_subjects(&statement).unwrap_err();
        assert!(err.to_string().contains("subject path missing"));
    }

    #[test]
    fn missing_uri_or_digest_is_reported() {
        let statement = serde_json::json!({"subject": [{"name": "s"}]});
        let err = verify_subjects(&statement).unwrap_err();
        assert!(err.to_string().contains("subject missing uri/digest"));
    }

    #[test]
    fn non_array_subject_is_reported() {
        let statement = serde_json::json!({"subject": "nope"});
        let err = verify_subjects(&statement).unwrap_err();
        assert!(err.to_string().contains("must be array"));
    }
}
