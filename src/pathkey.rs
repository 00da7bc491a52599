//! File key algebra
//!
//! A file key is the materialized full path of a node within a project,
//! unique per project. Directory keys always carry a trailing `/`; that
//! trailing separator is what makes prefix matching boundary-safe (a sibling
//! named `docs_report.txt` never matches the prefix `docs/`). Everything here
//! is pure string manipulation over keys.

/// Normalize a directory key to end with exactly one `/`.
pub fn normalize_dir_key(key: &str) -> String {
    let trimmed = key.trim_end_matches('/');
    format!("{}/", trimmed)
}

/// Leaf component of a key. Directory keys yield the last segment without the
/// trailing separator; the bare root key yields `/`.
pub fn basename(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Containing directory of a key, with its trailing separator.
/// `a/b/c.txt` -> `a/b/`, `a/b/c/` -> `a/b/`, `a` -> ``.
pub fn dir_of(key: &str) -> &str {
    let trimmed = key.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &key[..idx + 1],
        None => "",
    }
}

/// Join a directory key and a leaf name.
pub fn join(dir_key: &str, name: &str) -> String {
    format!("{}{}", normalize_dir_key(dir_key), name.trim_start_matches('/'))
}

/// Split a project-relative path into its segments, dropping empty runs.
pub fn segments(relative: &str) -> Vec<&str> {
    relative.split('/').filter(|s| !s.is_empty()).collect()
}

/// Whether `key` lies inside the sandbox rooted at `root_key`. Rejects keys
/// containing traversal segments regardless of the prefix test.
pub fn is_within(root_key: &str, key: &str) -> bool {
    let root = normalize_dir_key(root_key);
    if !key.starts_with(root.as_str()) {
        return false;
    }
    !segments(key).iter().any(|s| *s == "." || *s == "..")
}

/// Project-relative remainder of `key` under `root_key`, or `None` when the
/// key is outside the root.
pub fn relative_to<'a>(root_key: &str, key: &'a str) -> Option<&'a str> {
    let root = normalize_dir_key(root_key);
    key.strip_prefix(root.as_str())
}

/// Replace the directory prefix of `key`, boundary-safe.
///
/// Both prefixes are normalized to a trailing separator before matching, so
/// only keys genuinely under the old directory (or the directory key itself)
/// rewrite; any other substring occurrence is left alone. Returns `None` when
/// the key is not under the old prefix.
pub fn rewrite_prefix(key: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    let old = normalize_dir_key(old_prefix);
    let new = normalize_dir_key(new_prefix);
    key.strip_prefix(&old).map(|rest| format!("{}{}", new, rest))
}
