//! Vault-relative path handling
//!
//! Paths inside a vault are plain strings in a canonical form:
//! - `/` separated (backslashes are treated as separators)
//! - no leading or trailing slash
//! - no repeated slashes
//!
//! The empty string is the vault root. Every function here is pure and
//! re-normalizes its inputs, so callers may pass raw user input.

/// Canonicalizes a path string.
///
/// Total over all inputs: `""`, `"/"` and `"\\\\"` all map to `""`.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns the parent of `path`, or `""` for a root-level item
pub fn parent(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(idx) => normalized[..idx].to_string(),
        None => String::new(),
    }
}

/// Returns the last segment of `path`
pub fn name(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(idx) => normalized[idx + 1..].to_string(),
        None => normalized,
    }
}

/// Joins a directory and a child name into a normalized path
pub fn join(dir: &str, child: &str) -> String {
    let dir = normalize(dir);
    let child = normalize(child);
    match (dir.is_empty(), child.is_empty()) {
        (true, _) => child,
        (_, true) => dir,
        _ => format!("{}/{}", dir, child),
    }
}

/// True iff `item` sits directly inside `root`.
///
/// A root is never a top-level child of itself.
pub fn is_top_level_child(item: &str, root: &str) -> bool {
    let item = normalize(item);
    if item.is_empty() {
        return false;
    }
    parent(&item) == normalize(root)
}

/// True iff the two paths are equal or one is an ancestor of the other.
///
/// Comparison is anchored on segment boundaries: `Projects` and
/// `ProjectsExtra` are not nested. The vault root (`""`) is an ancestor
/// of everything.
pub fn is_nested(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);

    if a == b || a.is_empty() || b.is_empty() {
        return true;
    }

    is_ancestor(&a, &b) || is_ancestor(&b, &a)
}

fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    descendant.len() > ancestor.len()
        && descendant.starts_with(ancestor)
        && descendant.as_bytes()[ancestor.len()] == b'/'
}

/// Finds the first nested pair, scanning `(0,1), (0,2), .., (1,2), ..`
pub fn find_first_nested_pair<S: AsRef<str>>(paths: &[S]) -> Option<(usize, usize)> {
    for i in 0..paths.len() {
        for j in (i + 1)..paths.len() {
            if is_nested(paths[i].as_ref(), paths[j].as_ref()) {
                return Some((i, j));
            }
        }
    }
    None
}
