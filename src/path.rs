//! Path normalization, segmentation and prefix joining.
//!
//! Patterns and request paths go through the same functions so that
//! registration and lookup always agree on what a segment is.

/// Strips one trailing slash from anything longer than the root when
/// `strip_trailing` is set.
pub(crate) fn normalize(path: &str, strip_trailing: bool) -> &str {
    if strip_trailing && path.len() > 1 && path.ends_with('/') {
        &path[..path.len() - 1]
    } else {
        path
    }
}

/// Splits a normalized path into its non-empty segments.
///
/// A path that still ends in `/` (trailing-slash redirect disabled) yields one
/// extra empty segment, so `/a/` and `/a` land on different nodes.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    let trailing = path.len() > 1 && path.ends_with('/');
    path.split('/')
        .filter(|s| !s.is_empty())
        .chain(trailing.then_some(""))
}

/// Rebuilds the canonical `/a/b` form of a segment list.
pub(crate) fn canonical<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Joins a mount prefix and a route pattern with exactly one slash between them.
///
/// ```text
/// join("/admin",  "/users") == "/admin/users"
/// join("/admin/", "/")      == "/admin"
/// join("",        "users")  == "/users"
/// join("/",       "/")      == "/"
/// ```
pub fn join(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let pattern = pattern.trim_start_matches('/');

    match (prefix.is_empty(), pattern.is_empty()) {
        (true, true) => "/".to_owned(),
        (false, true) => prefix.to_owned(),
        (true, false) => format!("/{pattern}"),
        (false, false) if prefix.starts_with('/') => format!("{prefix}/{pattern}"),
        (false, false) => format!("/{prefix}/{pattern}"),
    }
}
