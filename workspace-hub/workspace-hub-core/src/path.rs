//! Path helpers: splitting slash-separated workspace paths and deriving the
//! map keys under which folders and files are stored.

use crate::error::{Result, WorkspaceError};

pub const SEPARATOR: char = '/';
const EXTENSION_SEPARATOR: char = '.';
const KEY_EXTENSION_SEPARATOR: char = '+';

/// Derive the map key for a file or folder name.
///
/// The last `.` is swapped for `+`, so `model_1.xml` is stored under
/// `model_1+xml`. Names without a `.` are used unchanged.
pub fn encode(name: &str) -> String {
    match name.rfind(EXTENSION_SEPARATOR) {
        Some(idx) => {
            let mut key = String::with_capacity(name.len());
            key.push_str(&name[..idx]);
            key.push(KEY_EXTENSION_SEPARATOR);
            key.push_str(&name[idx + 1..]);
            key
        }
        None => name.to_string(),
    }
}

/// Split a path into its segments. The empty path has no segments; any other
/// empty segment (leading, trailing or doubled `/`) is rejected.
pub fn split(path: &str) -> Result<Vec<&str>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = path.split(SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(WorkspaceError::invalid(format!("empty segment in '{}'", path)));
    }
    Ok(segments)
}

pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        return name.to_string();
    }
    format!("{}{}{}", parent, SEPARATOR, name)
}

/// Check that `name` can be used as a single path segment.
///
/// `+` is reserved for keys: `a+b` would otherwise share a key with `a.b`.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(WorkspaceError::invalid("name must not be empty"));
    }
    if name.contains(SEPARATOR) {
        return Err(WorkspaceError::invalid(format!(
            "name '{}' must not contain '{}'",
            name, SEPARATOR
        )));
    }
    if name.contains(KEY_EXTENSION_SEPARATOR) {
        return Err(WorkspaceError::invalid(format!(
            "name '{}' must not contain '{}'",
            name, KEY_EXTENSION_SEPARATOR
        )));
    }
    Ok(())
}
