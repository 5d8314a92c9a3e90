//! File, byte, and directory-tree digests.
//!
//! Directory trees are committed to via a sorted manifest: one line per
//! regular file, `<path>\0<digest>\0<size>\n`, paths relative to the root
//! with forward slashes. The tree digest is the SHA-256 of the manifest
//! bytes, so it is invariant under walk order and filesystem metadata.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// One regular file inside a digested tree.
#[derive(Debug, Clone)]
pub struct TreeEntry {
    /// Path relative to the tree root, forward-slash normalized.
    pub path: String,
    /// File digest in `sha256:<hex>` form.
    pub digest: String,
    /// File size in bytes.
    pub size: u64,
}

/// The result of digesting a directory tree.
#[derive(Debug, Clone)]
pub struct TreeDigest {
    /// Root digest in `sha256:<hex>` form.
    pub digest: String,
    /// The manifest the digest was computed over.
    pub manifest: String,
    /// Per-file entries, sorted by relative path.
    pub entries: Vec<TreeEntry>,
}

/// Stream a file through SHA-256, returning `(digest, size_bytes)`.
pub fn digest_file(path: &Path) -> Result<(String, u64), CoreError> {
    let mut file = File::open(path)
        .map_err(|e| CoreError::io(format!("open file {}", path.display()), e))?;
    let mut hasher = Sha256::new();
    let size = io::copy(&mut file, &mut hasher)
        .map_err(|e| CoreError::io(format!("hash file {}", path.display()), e))?;
    Ok((format!("sha256:{}", hex::encode(hasher.finalize())), size))
}

/// Digest every regular file under `root` into a sorted tree manifest.
///
/// An empty directory yields the digest of the empty string.
pub fn digest_tree(root: &Path) -> Result<TreeDigest, CoreError> {
    let mut entries = Vec::new();
    for item in walkdir::WalkDir::new(root) {
        let item =
            item.map_err(|e| CoreError::io(format!("walk tree {}", root.display()), e.into()))?;
        if !item.file_type().is_file() {
            continue;
        }
        let rel = item
            .path()
            .strip_prefix(root)
            .map_err(|_| {
                CoreError::io(
                    format!("walk tree {}", root.display()),
                    io::Error::new(io::ErrorKind::Other, "entry outside root"),
                )
            })?
            .to_string_lossy()
            .replace('\\', "/");
        let (digest, size) = digest_file(item.path())?;
        entries.push(TreeEntry {
            path: rel,
            digest,
            size,
        });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    let mut manifest = String::new();
    for entry in &entries {
        manifest.push_str(&format!(
            "{}\x00{}\x00{}\n",
            entry.path, entry.digest, entry.size
        ));
    }

    let mut hasher = Sha256::new();
    hasher.update(manifest.as_bytes());
    Ok(TreeDigest {
        digest: format!("sha256:{}", hex::encode(hasher.finalize())),
        manifest,
        entries,
    })
}

/// Whether a path exists (file or directory).
pub fn file_exists(path: &Path) -> bool {
    path.exists()
}
