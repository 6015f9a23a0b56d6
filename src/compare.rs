//! Tree comparison
//!
//! Classifies every path of two trees into exactly one of added, modified,
//! deleted or unchanged. Classification is by content fingerprint only.

use crate::error::OverlappingPaths;
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Change classification of a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

/// Result of comparing a source tree against a target tree.
///
/// The four sets are disjoint and their union is the union of both trees'
/// keys. A comparison is never mutated after construction, and a
/// deserialized one is rejected unless its sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ComparisonSets")]
pub struct Comparison {
    added: BTreeSet<String>,
    modified: BTreeSet<String>,
    deleted: BTreeSet<String>,
    unchanged: BTreeSet<String>,
}

/// Unchecked wire form of a comparison
#[derive(Deserialize)]
struct ComparisonSets {
    #[serde(default)]
    added: BTreeSet<String>,
    #[serde(default)]
    modified: BTreeSet<String>,
    #[serde(default)]
    deleted: BTreeSet<String>,
    #[serde(default)]
    unchanged: BTreeSet<String>,
}

impl TryFrom<ComparisonSets> for Comparison {
    type Error = OverlappingPaths;

    fn try_from(sets: ComparisonSets) -> Result<Self, Self::Error> {
        let mut seen = BTreeSet::new();
        let mut overlapping = BTreeSet::new();
        for path in sets
            .added
            .iter()
            .chain(&sets.modified)
            .chain(&sets.deleted)
            .chain(&sets.unchanged)
        {
            if !seen.insert(path) {
                overlapping.insert(path.clone());
            }
        }

        if !overlapping.is_empty() {
            return Err(OverlappingPaths {
                paths: overlapping.into_iter().collect(),
            });
        }

        Ok(Comparison {
            added: sets.added,
            modified: sets.modified,
            deleted: sets.deleted,
            unchanged: sets.unchanged,
        })
    }
}

/// Compare `source` (what is currently deployed) with `target` (what should
/// be deployed).
///
/// Pure and deterministic: no I/O, no content re-read, one key lookup per
/// path on each side.
pub fn compare(source: &Tree, target: &Tree) -> Comparison {
    let mut comparison = Comparison::default();

    for entry in source {
        match target.get(entry.path()) {
            None => {
                comparison.deleted.insert(entry.path().to_string());
            }
            Some(other) if other.same_content(entry) => {
                comparison.unchanged.insert(entry.path().to_string());
            }
            Some(_) => {
                comparison.modified.insert(entry.path().to_string());
            }
        }
    }

    for entry in target {
        if !source.contains(entry.path()) {
            comparison.added.insert(entry.path().to_string());
        }
    }

    comparison
}

impl Comparison {
    /// Paths present only in the target
    pub fn added(&self) -> &BTreeSet<String> {
        &self.added
    }

    /// Paths present in both with differing fingerprints
    pub fn modified(&self) -> &BTreeSet<String> {
        &self.modified
    }

    /// Paths present only in the source
    pub fn deleted(&self) -> &BTreeSet<String> {
        &self.deleted
    }

    /// Paths present in both with equal fingerprints
    pub fn unchanged(&self) -> &BTreeSet<String> {
        &self.unchanged
    }

    /// Classification of `path`, or `None` if neither tree had it
    pub fn kind_of(&self, path: &str) -> Option<ChangeKind> {
        if self.added.contains(path) {
            Some(ChangeKind::Added)
        } else if self.modified.contains(path) {
            Some(ChangeKind::Modified)
        } else if self.deleted.contains(path) {
            Some(ChangeKind::Deleted)
        } else if self.unchanged.contains(path) {
            Some(ChangeKind::Unchanged)
        } else {
            None
        }
    }

    /// True when nothing was added, modified or deleted
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Number of added, modified and deleted paths
    pub fn change_count(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    /// Added, modified and deleted paths
    pub fn changed(&self) -> BTreeSet<String> {
        self.added
            .iter()
            .chain(self.modified.iter())
            .chain(self.deleted.iter())
            .cloned()
            .collect()
    }

    /// Paths that must be written to the store: added and modified
    pub fn uploads(&self) -> impl Iterator<Item = &String> {
        self.added.iter().chain(self.modified.iter())
    }

    /// Paths whose cached copies are stale: modified and deleted, plus added
    /// when `include_added` is set.
    pub fn invalidation_candidates(&self, include_added: bool) -> BTreeSet<String> {
        let mut candidates: BTreeSet<String> =
            self.modified.union(&self.deleted).cloned().collect();
        if include_added {
            candidates.extend(self.added.iter().cloned());
        }
        candidates
    }

    /// Every path known to either tree
    pub fn all_paths(&self) -> impl Iterator<Item = &String> {
        self.added
            .iter()
            .chain(self.modified.iter())
            .chain(self.deleted.iter())
            .chain(self.unchanged.iter())
    }

    /// Serializable summary for display and audit logging
    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary {
            added_count: self.added.len(),
            modified_count: self.modified.len(),
            deleted_count: self.deleted.len(),
            unchanged_count: self.unchanged.len(),
            added: self.added.iter().cloned().collect(),
            modified: self.modified.iter().cloned().collect(),
            deleted: self.deleted.iter().cloned().collect(),
            unchanged: self.unchanged.iter().cloned().collect(),
        }
    }
}

/// Counts and sorted path lists of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    pub added_count: usize,
    pub modified_count: usize,
    pub deleted_count: usize,
    pub unchanged_count: usize,
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
    pub unchanged: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::PathEntry;

    fn tree(entries: &[(&str, u8)]) -> Tree {
        Tree::from_entries(
            entries
                .iter()
                .map(|(p, h)| PathEntry::new(*p, [*h; 32], 1)),
        )
        .unwrap()
    }

    #[test]
    fn test_added_file() {
        let a = tree(&[("x.txt", 1)]);
        let b = tree(&[("x.txt", 1), ("y.txt", 2)]);

        let comparison = compare(&a, &b);

        assert_eq!(comparison.added().iter().collect::<Vec<_>>(), vec!["y.txt"]);
        assert_eq!(
            comparison.unchanged().iter().collect::<Vec<_>>(),
            vec!["x.txt"]
        );
        assert!(comparison.modified().is_empty());
        assert!(comparison.deleted().is_empty());
    }

    #[test]
    fn test_modified_and_deleted() {
        let a = tree(&[("a", 1), ("b", 2), ("c", 3)]);
        let b = tree(&[("a", 1), ("b", 9)]);

        let comparison = compare(&a, &b);

        assert_eq!(comparison.kind_of("a"), Some(ChangeKind::Unchanged));
        assert_eq!(comparison.kind_of("b"), Some(ChangeKind::Modified));
        assert_eq!(comparison.kind_of("c"), Some(ChangeKind::Deleted));
        assert_eq!(comparison.kind_of("zzz"), None);
        assert_eq!(comparison.change_count(), 2);
    }

    #[test]
    fn test_size_change_without_content_change_is_unchanged() {
        let a = Tree::from_entries(vec![PathEntry::new("a", [1u8; 32], 1)]).unwrap();
        let b = Tree::from_entries(vec![PathEntry::new("a", [1u8; 32], 500)]).unwrap();
        assert_eq!(compare(&a, &b).kind_of("a"), Some(ChangeKind::Unchanged));
    }

    #[test]
    fn test_empty_source_all_added() {
        let b = tree(&[("a", 1), ("b", 2)]);
        let comparison = compare(&Tree::new(), &b);
        assert_eq!(comparison.added().len(), 2);
        assert_eq!(comparison.change_count(), 2);
    }

    #[test]
    fn test_empty_target_all_deleted() {
        let a = tree(&[("a", 1), ("b", 2)]);
        let comparison = compare(&a, &Tree::new());
        assert_eq!(comparison.deleted().len(), 2);
    }

    #[test]
    fn test_two_empty_trees() {
        let comparison = compare(&Tree::new(), &Tree::new());
        assert!(comparison.is_empty());
        assert_eq!(comparison.all_paths().count(), 0);
    }

    #[test]
    fn test_invalidation_candidates() {
        let a = tree(&[("kept", 1), ("changed", 2), ("gone", 3)]);
        let b = tree(&[("kept", 1), ("changed", 4), ("new", 5)]);
        let comparison = compare(&a, &b);

        let without: Vec<_> = comparison
            .invalidation_candidates(false)
            .into_iter()
            .collect();
        assert_eq!(without, vec!["changed", "gone"]);

        let with: Vec<_> = comparison
            .invalidation_candidates(true)
            .into_iter()
            .collect();
        assert_eq!(with, vec!["changed", "gone", "new"]);
    }

    #[test]
    fn test_summary_serializes() {
        let a = tree(&[("a", 1)]);
        let b = tree(&[("b", 1)]);
        let summary = compare(&a, &b).summary();
        assert_eq!(summary.added_count, 1);
        assert_eq!(summary.deleted_count, 1);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["added"][0], "b");
        assert_eq!(json["deleted"][0], "a");
    }

    #[test]
    fn test_deserialize_round_trips_a_comparison() {
        let a = tree(&[("kept", 1), ("changed", 2), ("gone", 3)]);
        let b = tree(&[("kept", 1), ("changed", 4), ("new", 5)]);
        let comparison = compare(&a, &b);

        let json = serde_json::to_string(&comparison).unwrap();
        let back: Comparison = serde_json::from_str(&json).unwrap();
        assert_eq!(back, comparison);
    }

    #[test]
    fn test_deserialize_rejects_overlapping_sets() {
        let json = r#"{"added":["x.txt"],"modified":[],"deleted":["x.txt"],"unchanged":[]}"#;
        let err = serde_json::from_str::<Comparison>(json).unwrap_err();
        assert!(err.to_string().contains("x.txt"));
    }
}
