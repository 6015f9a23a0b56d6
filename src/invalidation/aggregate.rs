//! Invalidation aggregation
//!
//! Turns a set of changed paths into the smallest pattern list that still
//! covers every change. A directory collapses into a wildcard when enough of
//! its children changed and the changed share of its cached population
//! reaches the configured threshold.

use crate::compare::Comparison;
use crate::error::{AggregationError, CoverageViolation};
use crate::invalidation::census::PathCensus;
use crate::invalidation::pattern::InvalidationPattern;
use crate::invalidation::trie::{CollapseRule, TrieNode};
use crate::tree::path::normalize_served_key;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, error, instrument};

/// Aggregation tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Minimum changed share of a directory's leaves before it collapses,
    /// within (0, 1]
    #[serde(default = "default_collapse_threshold")]
    pub collapse_threshold: f64,
    /// Minimum number of distinct changed children before a directory collapses
    #[serde(default = "default_min_changed_children")]
    pub min_changed_children: usize,
    /// Also invalidate added paths
    #[serde(default)]
    pub include_added: bool,
}

fn default_collapse_threshold() -> f64 {
    0.5
}

fn default_min_changed_children() -> usize {
    2
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            collapse_threshold: default_collapse_threshold(),
            min_changed_children: default_min_changed_children(),
            include_added: false,
        }
    }
}

/// Pure, reentrant pattern aggregator
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregationConfig,
}

impl Aggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Aggregate `changed` against the leaf counts in `census`.
    ///
    /// Changed paths may be tree keys (`a/b.txt`) or served paths
    /// (`/a/b.txt`); a path that does not normalize is rejected. Output is
    /// sorted by rendered form and free of duplicates. Changed paths missing
    /// from the census count as extra leaves of their directories.
    #[instrument(skip_all, fields(changed = changed.len()))]
    pub fn aggregate(
        &self,
        changed: &BTreeSet<String>,
        census: &PathCensus,
    ) -> Result<Vec<InvalidationPattern>, AggregationError> {
        let changed = changed
            .iter()
            .map(|path| normalize_served_key(path))
            .collect::<Result<BTreeSet<String>, _>>()?;
        if changed.is_empty() {
            return Ok(Vec::new());
        }

        let mut root = TrieNode::root();
        for path in &changed {
            root.insert(path, census.contains(path));
        }

        let rule = CollapseRule {
            threshold: self.config.collapse_threshold,
            min_changed_children: self.config.min_changed_children.max(1),
        };
        let mut patterns = root.resolve("", census, rule).patterns;
        patterns.sort();
        patterns.dedup();

        verify_coverage(&changed, &patterns)?;
        debug!(patterns = patterns.len(), "Aggregated invalidation patterns");
        Ok(patterns)
    }

    /// Aggregate the invalidation candidates of a comparison, counting the
    /// leaves of both trees
    pub fn aggregate_comparison(
        &self,
        comparison: &Comparison,
    ) -> Result<Vec<InvalidationPattern>, AggregationError> {
        let changed = comparison.invalidation_candidates(self.config.include_added);
        let census = PathCensus::from_comparison(comparison);
        self.aggregate(&changed, &census)
    }
}

/// Fail if any changed path is left uncovered by `patterns`
pub fn verify_coverage<'a, I>(
    changed: I,
    patterns: &[InvalidationPattern],
) -> Result<(), CoverageViolation>
where
    I: IntoIterator<Item = &'a String>,
{
    let uncovered: Vec<String> = changed
        .into_iter()
        .filter(|path| !patterns.iter().any(|pattern| pattern.covers(path)))
        .cloned()
        .collect();

    if uncovered.is_empty() {
        Ok(())
    } else {
        error!(count = uncovered.len(), "Invalidation patterns leave changes uncovered");
        Err(CoverageViolation { uncovered })
    }
}
