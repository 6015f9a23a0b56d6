//! CDN invalidation: pattern aggregation and batched submission

pub mod aggregate;
pub mod census;
pub mod invalidator;
pub mod pattern;
mod trie;

pub use aggregate::{verify_coverage, AggregationConfig, Aggregator};
pub use census::PathCensus;
pub use invalidator::{BatchOutcome, BatchResult, InvalidationReport, Invalidator, InvalidatorConfig};
pub use pattern::InvalidationPattern;
