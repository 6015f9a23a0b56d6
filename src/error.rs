//! Error types for the wood sync and invalidation engine.
//!
//! Tree construction failures are fatal to the construction call. Store and
//! CDN failures are recovered locally and recorded in run reports. A coverage
//! violation is a defect in the aggregator and is always fatal.

use thiserror::Error;

/// Tree construction or content read errors
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Duplicate path after normalization: {0}")]
    DuplicatePath(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),
}

impl ReadError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        ReadError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Object store errors for a single list, put or delete call
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Store rejected {path}: {reason}")]
    Rejected { path: String, reason: String },

    #[error("Store listing failed: {0}")]
    Listing(#[from] ReadError),

    #[error("Store task failed: {0}")]
    Task(String),
}

/// CDN invalidation errors for a single batch submission
#[derive(Debug, Error)]
pub enum InvalidationError {
    #[error("Invalidation request failed: {0}")]
    RequestFailed(String),

    #[error("Invalidation authentication failed: {0}")]
    AuthFailed(String),

    #[error("Invalidation rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("CDN reported failure: {0}")]
    Rejected(String),

    #[error("Empty invalidation batch")]
    EmptyBatch,

    /// Part of the batch was accepted before a later request failed
    #[error("Partially applied as {reference_id}: {reason}")]
    Partial {
        reference_id: String,
        reason: String,
    },
}

/// Aggregated patterns failed to cover every changed path.
///
/// This indicates a defect in the aggregator and must never be ignored.
#[derive(Debug, Clone, Error)]
#[error("Invalidation patterns do not cover {} changed path(s): {}", uncovered.len(), uncovered.join(", "))]
pub struct CoverageViolation {
    pub uncovered: Vec<String>,
}

/// A comparison whose change sets share paths
#[derive(Debug, Clone, Error)]
#[error("Comparison classifies {} path(s) more than once: {}", paths.len(), paths.join(", "))]
pub struct OverlappingPaths {
    pub paths: Vec<String>,
}

/// Aggregator input or output errors
#[derive(Debug, Error)]
pub enum AggregationError {
    #[error("Invalid changed path: {0}")]
    InvalidPath(#[from] ReadError),

    #[error(transparent)]
    Coverage(#[from] CoverageViolation),
}

/// Run-level errors surfaced to the caller
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Read error: {0}")]
    Read(#[from] ReadError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalidation error: {0}")]
    Invalidation(#[from] InvalidationError),

    #[error("Coverage violation: {0}")]
    Coverage(#[from] CoverageViolation),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<AggregationError> for ApiError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::InvalidPath(e) => ApiError::Read(e),
            AggregationError::Coverage(e) => ApiError::Coverage(e),
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Serialization(err.to_string())
    }
}
