//! Property-based tests for invalidation aggregation

use proptest::collection::btree_set;
use proptest::prelude::*;
use std::collections::BTreeSet;
use wood::invalidation::{
    verify_coverage, AggregationConfig, Aggregator, InvalidationPattern, PathCensus,
};

fn arb_universe() -> impl Strategy<Value = BTreeSet<String>> {
    btree_set("[a-d]{1,2}(/[a-d]{1,2}){0,3}", 1..40)
}

/// A universe plus a subset of it marked as changed
fn arb_changes() -> impl Strategy<Value = (BTreeSet<String>, BTreeSet<String>)> {
    arb_universe().prop_flat_map(|universe| {
        let paths: Vec<String> = universe.iter().cloned().collect();
        let len = paths.len();
        (
            Just(universe),
            proptest::sample::subsequence(paths, 0..=len)
                .prop_map(|subset| subset.into_iter().collect::<BTreeSet<_>>()),
        )
    })
}

fn config(threshold: f64) -> AggregationConfig {
    AggregationConfig {
        collapse_threshold: threshold,
        ..AggregationConfig::default()
    }
}

proptest! {
    /// Every changed path is covered by at least one pattern
    #[test]
    fn prop_patterns_cover_changes(
        (universe, changed) in arb_changes(),
        threshold in 0.05f64..=1.0,
    ) {
        let census = PathCensus::from_paths(universe.iter());
        let patterns = Aggregator::new(config(threshold)).aggregate(&changed, &census).unwrap();
        prop_assert!(verify_coverage(&changed, &patterns).is_ok());
        if changed.is_empty() {
            prop_assert!(patterns.is_empty());
        }
    }

    /// Output is sorted, free of duplicates and stable across calls
    #[test]
    fn prop_output_is_deterministic((universe, changed) in arb_changes()) {
        let census = PathCensus::from_paths(universe.iter());
        let aggregator = Aggregator::new(AggregationConfig::default());
        let first = aggregator.aggregate(&changed, &census).unwrap();
        let second = aggregator.aggregate(&changed, &census).unwrap();

        let mut sorted = first.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(&first, &sorted);
        prop_assert_eq!(first, second);
    }

    /// Never more patterns than changed paths
    #[test]
    fn prop_no_more_patterns_than_changes((universe, changed) in arb_changes()) {
        let census = PathCensus::from_paths(universe.iter());
        let patterns = Aggregator::new(AggregationConfig::default())
            .aggregate(&changed, &census)
            .unwrap();
        prop_assert!(patterns.len() <= changed.len());
    }

    /// Exact patterns only ever name changed paths
    #[test]
    fn prop_exact_patterns_name_changed_paths((universe, changed) in arb_changes()) {
        let census = PathCensus::from_paths(universe.iter());
        let patterns = Aggregator::new(AggregationConfig::default())
            .aggregate(&changed, &census)
            .unwrap();
        for pattern in &patterns {
            if let InvalidationPattern::Exact(path) = pattern {
                prop_assert!(changed.contains(path));
            }
        }
    }
}

proptest! {
    /// Dropping any single pattern leaves some change uncovered
    #[test]
    fn prop_every_pattern_is_needed(
        (universe, changed) in arb_changes(),
        threshold in 0.05f64..=1.0,
    ) {
        let census = PathCensus::from_paths(universe.iter());
        let patterns = Aggregator::new(config(threshold)).aggregate(&changed, &census).unwrap();
        for skip in 0..patterns.len() {
            let remaining: Vec<InvalidationPattern> = patterns
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != skip)
                .map(|(_, pattern)| pattern.clone())
                .collect();
            prop_assert!(
                verify_coverage(&changed, &remaining).is_err(),
                "pattern {} is redundant in {:?}",
                patterns[skip],
                patterns
            );
        }
    }
}
