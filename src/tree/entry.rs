//! Path entry: one file in a tree

use crate::types::Fingerprint;
use serde::{Deserialize, Serialize};

/// Immutable record of one file: normalized relative path, content
/// fingerprint and size in bytes.
///
/// Equality considers path and fingerprint only. Size is informational.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathEntry {
    path: String,
    fingerprint: Fingerprint,
    size: u64,
}

impl PathEntry {
    /// Create an entry. `path` must already be normalized; see
    /// [`crate::tree::path::normalize_key`].
    pub fn new(path: impl Into<String>, fingerprint: Fingerprint, size: u64) -> Self {
        Self {
            path: path.into(),
            fingerprint,
            size,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercase hex rendering of the fingerprint
    pub fn fingerprint_hex(&self) -> String {
        hex::encode(self.fingerprint)
    }

    /// Whether two entries for the same path carry the same content
    pub fn same_content(&self, other: &PathEntry) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl PartialEq for PathEntry {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.fingerprint == other.fingerprint
    }
}

impl Eq for PathEntry {}
