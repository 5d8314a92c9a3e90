//! Local bundle store.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Default on-disk location for attestation bundles.
pub const DEFAULT_ATTESTATION_DIR: &str = ".llmsa/attestations";

/// Copy a bundle file into `dir`, returning the destination path.
pub fn save_local(src_path: &Path, dir: &Path) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| StoreError::io(format!("create local store {}", dir.display()), e))?;
    let name = src_path
        .file_name()
        .ok_or_else(|| {
            StoreError::io(
                format!("resolve bundle name {}", src_path.display()),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
            )
        })?;
    let dst = dir.join(name);
    std::fs::copy(src_path, &dst)
        .map_err(|e| StoreError::io(format!("copy bundle to {}", dst.display()), e))?;
    Ok(dst)
}

/// Ensure the default attestation directory exists.
pub fn ensure_default_attestation_dir() -> Result<PathBuf, StoreError> {
    let dir = PathBuf::from(DEFAULT_ATTESTATION_DIR);
    std::fs::create_dir_all(&dir)
        .map_err(|e| StoreError::io(format!("create local store {}", dir.display()), e))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_copies_into_store() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("a.bundle.json");
        std::fs::write(&src, b"{}").expect("write");
        let store = tmp.path().join("store");

        let dst = save_local(&src, &store).expect("save");
        assert!(dst.ends_with("a.bundle.json"));
        assert_eq!(std::fs::read(&dst).expect("read"), b"{}");
    }

    #[test]
    fn save_missing_source_is_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let result = save_local(&tmp.path().join("missing.json"), &tmp.path().join("store"));
        assert!(matches!(result, Err(StoreError::Io { .. })));
    }
}
