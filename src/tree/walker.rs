//! Filesystem walker for traversing directory structures

use crate::error::ReadError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A regular file found by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Size reported by the filesystem
    pub size: u64,
}

/// Filesystem walker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Whether to follow symbolic links (default: false for determinism)
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Path components to ignore (e.g., ".git", ".DS_Store")
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    /// File name suffixes to ignore (e.g., ".tmp")
    #[serde(default)]
    pub ignore_suffixes: Vec<String>,
    /// Maximum depth to traverse (None = unlimited)
    #[serde(default)]
    pub max_depth: Option<usize>,
}

fn default_ignore_patterns() -> Vec<String> {
    vec![".git".to_string(), ".DS_Store".to_string()]
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            ignore_patterns: default_ignore_patterns(),
            ignore_suffixes: Vec::new(),
            max_depth: None,
        }
    }
}

/// Filesystem walker
pub struct Walker {
    root: PathBuf,
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: WalkerConfig::default(),
        }
    }

    /// Create a walker with custom configuration
    pub fn with_config(root: PathBuf, config: WalkerConfig) -> Self {
        Self { root, config }
    }

    /// Walk the filesystem and collect all regular files
    ///
    /// Returns files sorted by path for determinism. Directories are implied
    /// by file paths and are not reported.
    pub fn walk(&self) -> Result<Vec<WalkedFile>, ReadError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .max_depth(self.config.max_depth.unwrap_or(usize::MAX));

        let root = self.root.as_path();
        let iter = walker
            .into_iter()
            .filter_entry(|entry| !self.should_ignore(root, entry));

        for entry in iter {
            let entry = entry.map_err(|e| ReadError::Walk(e.to_string()))?;

            if entry.path() == self.root {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| {
                ReadError::Walk(format!(
                    "Failed to read metadata for {}: {}",
                    entry.path().display(),
                    e
                ))
            })?;

            // Symlinks are skipped unless followed
            if metadata.is_file() {
                files.push(WalkedFile {
                    path: entry.into_path(),
                    size: metadata.len(),
                });
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(files)
    }

    /// Check if an entry should be ignored based on ignore patterns.
    ///
    /// Only components below the root are matched, so a root that happens to
    /// live under an ignored name is still walked.
    fn should_ignore(&self, root: &Path, entry: &DirEntry) -> bool {
        let relative = match entry.path().strip_prefix(root) {
            Ok(r) => r,
            Err(_) => return false,
        };

        relative.components().any(|component| match component {
            std::path::Component::Normal(name) => {
                let name = name.to_string_lossy();
                self.config
                    .ignore_patterns
                    .iter()
                    .any(|pattern| name == pattern.as_str())
                    || self
                        .config
                        .ignore_suffixes
                        .iter()
                        .any(|suffix| name.ends_with(suffix.as_str()))
            }
            _ => false,
        })
    }
}
