//! Integration tests for invalidation aggregation and batching

use std::collections::BTreeSet;
use std::sync::Arc;
use wood::cdn::{CdnInvalidator, DryRunInvalidator};
use wood::compare::compare;
use wood::concurrency::CancelToken;
use wood::invalidation::{
    verify_coverage, AggregationConfig, Aggregator, InvalidationPattern, Invalidator,
    InvalidatorConfig, PathCensus,
};
use wood::tree::Tree;

fn changed(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

fn rendered(patterns: &[InvalidationPattern]) -> Vec<String> {
    patterns.iter().map(ToString::to_string).collect()
}

#[test]
fn test_fully_changed_directory_collapses() {
    let census = PathCensus::from_paths(["a/b.txt", "a/c.txt"]);
    let patterns = Aggregator::new(AggregationConfig::default())
        .aggregate(&changed(&["a/b.txt", "a/c.txt"]), &census)
        .unwrap();
    assert_eq!(rendered(&patterns), vec!["/a/*"]);
}

#[test]
fn test_served_paths_aggregate_like_keys() {
    let served = changed(&["/a/b.txt", "/a/c.txt"]);
    let census = PathCensus::from_paths(served.iter());
    let patterns = Aggregator::new(AggregationConfig::default())
        .aggregate(&served, &census)
        .unwrap();
    assert_eq!(rendered(&patterns), vec!["/a/*"]);
}

#[test]
fn test_sparse_change_stays_exact() {
    let mut paths: Vec<String> = (0..99).map(|i| format!("a/file{:03}.txt", i)).collect();
    paths.push("a/b.txt".to_string());
    let census = PathCensus::from_paths(paths.iter());

    let patterns = Aggregator::new(AggregationConfig::default())
        .aggregate(&changed(&["a/b.txt"]), &census)
        .unwrap();
    assert_eq!(rendered(&patterns), vec!["/a/b.txt"]);
}

#[test]
fn test_everything_changed_is_root_wildcard() {
    let remote = Tree::from_contents(vec![("a/x", "1"), ("b/y", "1"), ("z", "1")]).unwrap();
    let local = Tree::from_contents(vec![("a/x", "2"), ("b/y", "2"), ("z", "2")]).unwrap();
    let comparison = compare(&remote, &local);

    let patterns = Aggregator::new(AggregationConfig::default())
        .aggregate_comparison(&comparison)
        .unwrap();
    assert_eq!(rendered(&patterns), vec!["/*"]);
}

#[test]
fn test_patterns_always_cover_changes() {
    let census = PathCensus::from_paths([
        "docs/a.md",
        "docs/b.md",
        "docs/c.md",
        "docs/img/1.png",
        "docs/img/2.png",
        "index.html",
        "robots.txt",
        "favicon.ico",
        "about.html",
    ]);
    let changes = changed(&["docs/a.md", "docs/img/1.png", "docs/img/2.png", "index.html"]);

    let patterns = Aggregator::new(AggregationConfig::default())
        .aggregate(&changes, &census)
        .unwrap();
    verify_coverage(&changes, &patterns).unwrap();
    assert_eq!(rendered(&patterns), vec!["/docs/*", "/index.html"]);
}

#[tokio::test]
async fn test_patterns_are_batched_to_provider_limit() {
    let patterns: Vec<InvalidationPattern> = (0..7)
        .map(|i| InvalidationPattern::exact(format!("f{}.txt", i)))
        .collect();
    let cdn = Arc::new(DryRunInvalidator::new("edge", 3));
    let invalidator = Invalidator::new(
        cdn.clone() as Arc<dyn CdnInvalidator>,
        InvalidatorConfig::default(),
    );

    let report = invalidator.invalidate(&patterns, &CancelToken::new()).await;

    assert!(report.is_success());
    assert_eq!(report.reference_ids().len(), 3);
    let sizes: Vec<usize> = cdn.submitted().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 3, 1]);
}

#[tokio::test]
async fn test_resubmitting_same_patterns_is_safe() {
    let patterns = vec![InvalidationPattern::prefix("img")];
    let cdn = Arc::new(DryRunInvalidator::default());
    let invalidator = Invalidator::new(
        cdn.clone() as Arc<dyn CdnInvalidator>,
        InvalidatorConfig::default(),
    );

    let first = invalidator.invalidate(&patterns, &CancelToken::new()).await;
    let second = invalidator.invalidate(&patterns, &CancelToken::new()).await;

    assert!(first.is_success() && second.is_success());
    assert_ne!(first.reference_ids(), second.reference_ids());
    assert_eq!(cdn.submitted().len(), 2);
}
