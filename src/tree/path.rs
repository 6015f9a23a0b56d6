//! Path canonicalization and normalization utilities
//!
//! Tree keys are relative, slash-separated and Unicode NFC. They never start
//! with a slash and never contain `.` or `..` components, so a key can be
//! used unchanged as an object-store key or a CDN path.

use crate::error::ReadError;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Canonical key separator
pub const SEPARATOR: char = '/';

/// Canonicalize a root directory (resolves symlinks, `..`, `.`)
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, ReadError> {
    let canonical = dunce::canonicalize(path).map_err(|e| {
        ReadError::InvalidPath(format!(
            "Failed to canonicalize {}: {}",
            path.display(),
            e
        ))
    })?;

    if !canonical.is_dir() {
        return Err(ReadError::NotADirectory(canonical.display().to_string()));
    }

    Ok(canonical)
}

/// Normalize a raw key into canonical form.
///
/// Backslashes become slashes, Unicode is normalized to NFC, empty and `.`
/// segments are dropped. Absolute keys and `..` segments are rejected: a key
/// must stay inside the root it was declared against.
pub fn normalize_key(raw: &str) -> Result<String, ReadError> {
    let unified: String = raw.replace('\\', "/").nfc().collect();

    if unified.starts_with(SEPARATOR) || has_drive_prefix(&unified) {
        return Err(ReadError::InvalidPath(format!(
            "Absolute path not allowed: {}",
            raw
        )));
    }

    let mut segments = Vec::new();
    for segment in unified.split(SEPARATOR) {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(ReadError::InvalidPath(format!(
                    "Parent traversal not allowed: {}",
                    raw
                )))
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(ReadError::InvalidPath(format!("Empty path: {:?}", raw)));
    }

    Ok(segments.join("/"))
}

/// Normalize a key that may be written in served form (`/a/b.txt`).
///
/// Leading slashes are dropped before the usual normalization, so CDN paths
/// and tree keys resolve to the same key.
pub fn normalize_served_key(raw: &str) -> Result<String, ReadError> {
    normalize_key(raw.trim_start_matches(SEPARATOR))
}

/// `C:/...` is a drive-absolute path everywhere. A bare `c:name` is a legal
/// file name outside Windows.
fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || !bytes[0].is_ascii_alphabetic() || bytes[1] != b':' {
        return false;
    }
    cfg!(windows) || bytes.get(2) == Some(&b'/')
}

/// Compute the normalized key of `path` relative to `root`.
///
/// Both paths must be in the same (canonical) form. A path outside `root` is
/// an error rather than being leaked as an absolute key.
pub fn relative_key(root: &Path, path: &Path) -> Result<String, ReadError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        ReadError::InvalidPath(format!(
            "{} is not inside {}",
            path.display(),
            root.display()
        ))
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => {
                let name = name.to_str().ok_or_else(|| {
                    ReadError::InvalidPath(format!("Non UTF-8 path: {}", path.display()))
                })?;
                parts.push(name);
            }
            Component::CurDir => {}
            _ => {
                return Err(ReadError::InvalidPath(format!(
                    "Unexpected component in {}",
                    path.display()
                )))
            }
        }
    }

    normalize_key(&parts.join("/"))
}

/// Resolve a normalized key against a root directory
pub fn key_to_path(root: &Path, key: &str) -> PathBuf {
    key.split(SEPARATOR)
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}

/// Directory portion of a key, or `None` for a top-level file
pub fn parent_dir(key: &str) -> Option<&str> {
    key.rfind(SEPARATOR).map(|idx| &key[..idx])
}
