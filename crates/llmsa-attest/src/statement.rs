//! Statement construction helpers shared by all collectors.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use llmsa_core::canonical::{bare_hex, digest_bytes};
use llmsa_core::digest::{digest_file, digest_tree};
use llmsa_core::statement::{
    AttestationKind, Generator, Predicate, Privacy, Statement, Subject, SubjectDigest,
    SCHEMA_VERSION,
};

use crate::error::AttestError;

/// Build a fresh statement around a collected predicate.
///
/// The statement id and `generated_at` are runtime nonces; the determinism
/// self-check overwrites them before comparing hashes.
pub fn new_statement(
    kind: AttestationKind,
    predicate: Predicate,
    subjects: Vec<Subject>,
    materials: Vec<Subject>,
) -> Statement {
    let mut annotations = BTreeMap::new();
    annotations.insert("generated_by".to_owned(), "llmsa attest create".to_owned());

    Statement {
        schema_version: SCHEMA_VERSION.to_owned(),
        statement_id: uuid::Uuid::new_v4().to_string(),
        attestation_type: kind,
        predicate_type: kind.predicate_uri().to_owned(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        generator: Generator {
            name: "llmsa".to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            git_sha: read_git_sha(),
        },
        subject: subjects,
        materials,
        predicate,
        privacy: Privacy::hash_only(),
        annotations,
    }
}

/// Stamp the `depends_on` annotation: trimmed, deduplicated, ASCII-sorted,
/// comma-joined. Empty dependency sets leave the annotation absent.
pub fn set_depends_on(statement: &mut Statement, deps: &[&str]) {
    let unique: BTreeSet<&str> = deps
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .collect();
    if unique.is_empty() {
        return;
    }
    let joined = unique.into_iter().collect::<Vec<_>>().join(",");
    statement
        .annotations
        .insert("depends_on".to_owned(), joined);
}

fn read_git_sha() -> String {
    match std::env::var("GITHUB_SHA") {
        Ok(v) if !v.is_empty() => v,
        _ => "local".to_owned(),
    }
}

/// Build a subject for a file or directory path.
///
/// Files carry their content digest and size; directories carry the tree
/// manifest digest and size 0.
pub fn subject_from_path(path: &str) -> Result<Subject, AttestError> {
    let p = Path::new(path);
    let meta = std::fs::metadata(p)
        .map_err(|e| AttestError::io(format!("stat subject {path}"), e))?;
    let name = p
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_owned());
    let uri = path.replace('\\', "/");

    if meta.is_dir() {
        let tree = digest_tree(p)?;
        return Ok(Subject {
            name,
            uri,
            digest: SubjectDigest {
                sha256: bare_hex(&tree.digest).to_owned(),
            },
            size_bytes: 0,
        });
    }

    let (digest, size) = digest_file(p)?;
    Ok(Subject {
        name,
        uri,
        digest: SubjectDigest {
            sha256: bare_hex(&digest).to_owned(),
        },
        size_bytes: size,
    })
}

/// Digest every file under a directory, returning the sorted digest list
/// and one subject per file.
pub fn sorted_file_digests(dir: &str) -> Result<(Vec<String>, Vec<Subject>), AttestError> {
    let tree = digest_tree(Path::new(dir))?;
    let mut digests = Vec::with_capacity(tree.entries.len());
    let mut subjects = Vec::with_capacity(tree.entries.len());
    for entry in &tree.entries {
        digests.push(entry.digest.clone());
        subjects.push(Subject {
            name: entry.path.clone(),
            uri: format!("{}/{}", dir.trim_end_matches('/'), entry.path).replace('\\', "/"),
            digest: SubjectDigest {
                sha256: bare_hex(&entry.digest).to_owned(),
            },
            size_bytes: entry.size,
        });
    }
    digests.sort();
    Ok((digests, subjects))
}

/// Digest of a configuration string value.
pub fn digest_of_string(value: &str) -> String {
    digest_bytes(value.as_bytes())
}

/// Order-independent summary digest: sort the parts, join with newlines,
/// hash the result.
pub fn bundle_digest<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut parts: Vec<String> = parts.into_iter().map(Into::into).collect();
    parts.sort();
    digest_bytes(parts.join("\n").as_bytes())
}
