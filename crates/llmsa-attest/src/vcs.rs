//! Changed-file collection from git.
//!
//! The pipeline consumes a plain list of changed paths; collection shells
//! out to the porcelain CLI. Outside a repository (or when the diff fails)
//! the changed set is empty rather than an error, so changed-only flows
//! degrade to "nothing matched".

use std::process::Command;

/// Paths changed between `git_ref` and HEAD, forward-slash normalized.
///
/// An empty `git_ref` defaults to `HEAD~1`.
pub fn changed_files(git_ref: &str) -> Vec<String> {
    let git_ref = if git_ref.is_empty() { "HEAD~1" } else { git_ref };

    let head_ok = Command::new("git")
        .args(["rev-parse", "--verify", "HEAD"])
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !head_ok {
        return Vec::new();
    }

    let output = match Command::new("git")
        .args(["diff", "--name-only", &format!("{git_ref}...HEAD")])
        .output()
    {
        Ok(o) if o.status.success() => o,
        _ => return Vec::new(),
    };

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.replace('\\', "/"))
        .collect()
}
