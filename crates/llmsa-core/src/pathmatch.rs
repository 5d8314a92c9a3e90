//! Changed-path pattern matching shared by collectors and policy gates.
//!
//! Three rules, checked in order:
//!
//! 1. `prefix/**` matches `prefix` itself and everything below it.
//! 2. Otherwise the pattern is a shell glob (`*` and `?` do not cross
//!    path separators; `**` is recursive).
//! 3. A pattern ending in `*` also matches as a plain prefix, crossing
//!    separators.
//!
//! Paths and patterns are normalized to forward slashes before matching.

use globset::GlobBuilder;

/// Whether `path` matches `pattern` under the changed-path rules.
pub fn path_matches(path: &str, pattern: &str) -> bool {
    let pattern = pattern.replace('\\', "/");
    let path = path.replace('\\', "/");

    if let Some(prefix) = pattern.strip_suffix("/**") {
        return path == prefix || path.starts_with(&format!("{prefix}/"));
    }

    if let Ok(glob) = GlobBuilder::new(&pattern).literal_separator(true).build() {
        if glob.compile_matcher().is_match(path.as_str()) {
            return true;
        }
    }

    if let Some(prefix) = pattern.strip_suffix('*') {
        return path.starts_with(prefix);
    }

    false
}

/// Whether any changed path matches any of the patterns.
pub fn any_match(changed: &[String], patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|p| changed.iter().any(|c| path_matches(c, p)))
}
