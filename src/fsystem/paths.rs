// Helpers for the `/`-separated virtual paths used as node keys.

use crate::errors::{ConsoleError, Result};

/// Strips a trailing `/` and rejects anything that cannot name a node:
/// empty paths, absolute paths, and empty, `.` or `..` segments.
pub(crate) fn normalize(path: &str) -> Result<&str> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Err(ConsoleError::invalid_path("Path is empty".to_string()));
    }
    if trimmed.starts_with('/') {
        return Err(ConsoleError::invalid_path(format!(
            "Path {} must be relative to the workspace root",
            path
        )));
    }
    for segment in trimmed.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(ConsoleError::invalid_path(format!(
                "Path {} contains an invalid segment",
                path
            )));
        }
    }
    Ok(trimmed)
}

pub(crate) fn name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

/// Proper ancestors of `path`, outermost first: `a/b/c` yields `a`, `a/b`.
pub(crate) fn ancestors(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(i, _)| &path[..i])
}

/// True when `path` lies strictly below the folder `prefix`.
pub(crate) fn is_within(path: &str, prefix: &str) -> bool {
    path.len() > prefix.len()
        && path.starts_with(prefix)
        && path.as_bytes()[prefix.len()] == b'/'
}

/// Moves `path` from under `old_prefix` to under `new_prefix`. Paths outside
/// the old prefix come back unchanged.
pub(crate) fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> String {
    if path == old_prefix {
        new_prefix.to_string()
    } else if is_within(path, old_prefix) {
        format!("{}{}", new_prefix, &path[old_prefix.len()..])
    } else {
        path.to_string()
    }
}

pub(crate) fn language_for_path(path: &str) -> &'static str {
    let extension = name(path)
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("ts") | Some("tsx") => "typescript",
        Some("js") | Some("jsx") => "javascript",
        Some("json") => "json",
        Some("css") => "css",
        Some("html") => "html",
        Some("md") => "markdown",
        Some("py") => "python",
        _ => "plaintext",
    }
}
