//! Cached-population counts per directory
//!
//! The aggregator weighs a wildcard by how many objects it would invalidate,
//! which is every leaf below the directory, changed or not.

use crate::compare::Comparison;
use crate::tree::path::{normalize_served_key, parent_dir};
use crate::tree::Tree;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Leaf counts below every directory of a path universe.
///
/// The root directory is the empty string. Paths are normalized like changed
/// paths, so `/a/b.txt` and `a/b.txt` are the same leaf; a path that does not
/// normalize is left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathCensus {
    leaves: BTreeSet<String>,
    totals: BTreeMap<String, usize>,
}

impl PathCensus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut census = Self::new();
        for path in paths {
            census.insert(path.into());
        }
        census
    }

    pub fn from_tree(tree: &Tree) -> Self {
        Self::from_paths(tree.paths().cloned())
    }

    /// Census over both trees of a comparison. Deleted paths still count:
    /// their cached copies are part of what a wildcard would invalidate.
    pub fn from_comparison(comparison: &Comparison) -> Self {
        Self::from_paths(comparison.all_paths().cloned())
    }

    fn insert(&mut self, raw: String) {
        let path = match normalize_served_key(&raw) {
            Ok(path) => path,
            Err(e) => {
                warn!(path = %raw, error = %e, "Skipping path outside the census");
                return;
            }
        };
        if self.leaves.contains(&path) {
            return;
        }
        let mut dir = parent_dir(&path);
        while let Some(current) = dir {
            *self.totals.entry(current.to_string()).or_insert(0) += 1;
            dir = parent_dir(current);
        }
        *self.totals.entry(String::new()).or_insert(0) += 1;
        self.leaves.insert(path);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.leaves.contains(path)
    }

    /// Number of leaves below `dir`
    pub fn total_under(&self, dir: &str) -> usize {
        self.totals.get(dir).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}
