//! Helpers for the absolute, `/`-separated paths used to address
//! entries on the remote side.

/// Join a directory path and a child name without doubling the
/// separator under the root.
pub fn join(parent: &str, name: &str) -> String {
    let mut path = String::with_capacity(parent.len() + name.len() + 1);
    path.push_str(parent);
    if !path.ends_with('/') {
        path.push('/');
    }
    path.push_str(name);
    path
}

/// Split an absolute path into its parent path and final component.
///
/// Returns `None` for the root, relative paths, and paths ending in `.`
/// or `..`.
pub fn split_parent(path: &str) -> Option<(&str, &str)> {
    if !path.starts_with('/') {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    let (parent, name) = trimmed.rsplit_once('/')?;
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some((if parent.is_empty() { "/" } else { parent }, name))
}
