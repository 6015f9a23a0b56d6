//! Integration tests for the wood sync and invalidation engine

mod aggregation;
mod config_integration;
mod deploy_end_to_end;
mod sync_ordering;
mod test_utils;
mod tree_determinism;
