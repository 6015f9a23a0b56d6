//! Property-based tests for comparison and aggregation guarantees

mod aggregation;
mod comparison;
