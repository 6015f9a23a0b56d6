//! CDN invalidation capability
//!
//! The invalidator only depends on [`CdnInvalidator`]. Each implementation
//! declares how many patterns fit in one request; the caller batches to that
//! limit. Retry and backoff belong to the implementation.

pub mod cloudflare;
pub mod dry_run;

pub use cloudflare::{CloudflareConfig, CloudflareInvalidator};
pub use dry_run::DryRunInvalidator;

use crate::error::InvalidationError;
use crate::invalidation::InvalidationPattern;
use crate::types::ReferenceId;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// A CDN that accepts invalidation requests
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CdnInvalidator: Send + Sync {
    /// Submit one batch; returns the provider's reference for status polling
    async fn invalidate(
        &self,
        patterns: &[InvalidationPattern],
    ) -> Result<ReferenceId, InvalidationError>;

    /// Most patterns one request may carry
    fn max_patterns_per_request(&self) -> usize;

    /// Provider name used in logs and reports
    fn name(&self) -> String;
}
