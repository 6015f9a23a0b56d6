//! Prefix trie over changed paths
//!
//! Each directory node owns its children outright. Resolution walks the trie
//! bottom-up and decides per directory whether its changes collapse into one
//! wildcard.

use crate::invalidation::census::PathCensus;
use crate::invalidation::pattern::InvalidationPattern;
use std::collections::BTreeMap;

/// Collapse parameters consumed during resolution
#[derive(Debug, Clone, Copy)]
pub(crate) struct CollapseRule {
    pub threshold: f64,
    pub min_changed_children: usize,
}

impl CollapseRule {
    /// Ties collapse
    fn collapses(&self, distinct_children: usize, changed: usize, total: usize) -> bool {
        if distinct_children < self.min_changed_children || total == 0 {
            return false;
        }
        changed as f64 / total as f64 >= self.threshold
    }
}

#[derive(Debug, Default)]
pub(crate) struct TrieNode {
    /// A changed object sits exactly at this node's path
    changed_leaf: bool,
    /// That object is absent from the census
    unlisted_leaf: bool,
    children: BTreeMap<String, TrieNode>,
}

/// Patterns and counts contributed by one directory
#[derive(Debug, Default)]
pub(crate) struct Resolved {
    pub patterns: Vec<InvalidationPattern>,
    /// Changed leaves below the directory
    pub changed: usize,
    /// Changed leaves the census does not know about
    pub unlisted: usize,
}

fn join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", dir, name)
    }
}

impl TrieNode {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: &str, listed: bool) {
        let node = path
            .split('/')
            .fold(self, |node, segment| {
                node.children.entry(segment.to_string()).or_default()
            });
        node.changed_leaf = true;
        node.unlisted_leaf = !listed;
    }

    /// Resolve the directory at `dir`, children first
    pub fn resolve(&self, dir: &str, census: &PathCensus, rule: CollapseRule) -> Resolved {
        let mut resolved = Resolved::default();

        for (name, child) in &self.children {
            let child_path = join(dir, name);
            if child.changed_leaf {
                resolved.changed += 1;
                if child.unlisted_leaf {
                    resolved.unlisted += 1;
                }
                resolved
                    .patterns
                    .push(InvalidationPattern::Exact(child_path.clone()));
            }
            if !child.children.is_empty() {
                let below = child.resolve(&child_path, census, rule);
                resolved.changed += below.changed;
                resolved.unlisted += below.unlisted;
                resolved.patterns.extend(below.patterns);
            }
        }

        let total = census.total_under(dir) + resolved.unlisted;
        if rule.collapses(self.children.len(), resolved.changed, total) {
            resolved.patterns = vec![InvalidationPattern::Prefix(dir.to_string())];
        }
        resolved
    }
}
