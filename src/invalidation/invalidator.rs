//! Batched submission of invalidation patterns to one CDN
//!
//! Patterns are split into batches no larger than both the configured and
//! the provider's per-request limit. Every batch is submitted once; a failed
//! batch is reported and the rest are still submitted.

use crate::cdn::CdnInvalidator;
use crate::concurrency::{CancelToken, WorkerPool};
use crate::error::InvalidationError;
use crate::invalidation::pattern::InvalidationPattern;
use crate::types::ReferenceId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Invalidator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidatorConfig {
    /// Upper bound on patterns per request; the provider's own limit also applies
    #[serde(default = "default_max_patterns_per_request")]
    pub max_patterns_per_request: usize,
    /// Batches in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_patterns_per_request() -> usize {
    1000
}

fn default_max_concurrent() -> usize {
    1
}

impl Default for InvalidatorConfig {
    fn default() -> Self {
        Self {
            max_patterns_per_request: default_max_patterns_per_request(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchOutcome {
    Submitted { reference_id: ReferenceId },
    /// Some requests of the batch were accepted, a later one failed
    Partial { reference_id: ReferenceId, reason: String },
    Failed { reason: String },
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub patterns: Vec<InvalidationPattern>,
    pub outcome: BatchOutcome,
}

/// Per-batch results for one CDN, in batch order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidationReport {
    pub cdn: String,
    pub batches: Vec<BatchResult>,
    pub duration_ms: u64,
}

impl InvalidationReport {
    /// Reference IDs of submitted and partially applied batches, in batch order
    pub fn reference_ids(&self) -> Vec<&str> {
        self.batches
            .iter()
            .filter_map(|b| match &b.outcome {
                BatchOutcome::Submitted { reference_id }
                | BatchOutcome::Partial { reference_id, .. } => Some(reference_id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Failed and partially applied batches
    pub fn failed(&self) -> impl Iterator<Item = &BatchResult> {
        self.batches.iter().filter(|b| {
            matches!(
                b.outcome,
                BatchOutcome::Failed { .. } | BatchOutcome::Partial { .. }
            )
        })
    }

    pub fn skipped(&self) -> impl Iterator<Item = &BatchResult> {
        self.batches
            .iter()
            .filter(|b| b.outcome == BatchOutcome::Skipped)
    }

    pub fn is_success(&self) -> bool {
        self.batches
            .iter()
            .all(|b| matches!(b.outcome, BatchOutcome::Submitted { .. }))
    }
}

/// Submits pattern batches to one CDN
pub struct Invalidator {
    cdn: Arc<dyn CdnInvalidator>,
    config: InvalidatorConfig,
    pool: WorkerPool,
}

impl Invalidator {
    pub fn new(cdn: Arc<dyn CdnInvalidator>, config: InvalidatorConfig) -> Self {
        let pool = WorkerPool::new(config.max_concurrent);
        Self { cdn, config, pool }
    }

    /// Effective batch size: the smaller of both limits, at least one
    pub fn batch_size(&self) -> usize {
        self.config
            .max_patterns_per_request
            .min(self.cdn.max_patterns_per_request())
            .max(1)
    }

    /// Split `patterns` into ordered batches
    pub fn batches(&self, patterns: &[InvalidationPattern]) -> Vec<Vec<InvalidationPattern>> {
        patterns
            .chunks(self.batch_size())
            .map(<[InvalidationPattern]>::to_vec)
            .collect()
    }

    /// Submit every batch once. Empty input submits nothing.
    #[instrument(skip_all, fields(cdn = %self.cdn.name(), patterns = patterns.len()))]
    pub async fn invalidate(
        &self,
        patterns: &[InvalidationPattern],
        cancel: &CancelToken,
    ) -> InvalidationReport {
        let start = Instant::now();
        let cdn_name = self.cdn.name();
        if patterns.is_empty() {
            debug!("No patterns to invalidate");
            return InvalidationReport {
                cdn: cdn_name,
                ..InvalidationReport::default()
            };
        }

        let batches = self.batches(patterns);
        info!(batches = batches.len(), batch_size = self.batch_size(), "Submitting invalidations");

        let mut pending: Vec<(Vec<InvalidationPattern>, Option<JoinHandle<BatchOutcome>>)> =
            Vec::with_capacity(batches.len());
        for batch in batches {
            let permit = match self.pool.acquire(cancel).await {
                Some(permit) => permit,
                None => {
                    pending.push((batch, None));
                    continue;
                }
            };

            let cdn = Arc::clone(&self.cdn);
            let task_batch = batch.clone();
            let handle = tokio::spawn(async move {
                let outcome = match cdn.invalidate(&task_batch).await {
                    Ok(reference_id) => BatchOutcome::Submitted { reference_id },
                    Err(InvalidationError::Partial {
                        reference_id,
                        reason,
                    }) => {
                        warn!(patterns = task_batch.len(), reference = %reference_id, error = %reason, "Invalidation batch partially applied");
                        BatchOutcome::Partial {
                            reference_id,
                            reason,
                        }
                    }
                    Err(e) => {
                        warn!(patterns = task_batch.len(), error = %e, "Invalidation batch failed");
                        BatchOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                };
                drop(permit);
                outcome
            });
            pending.push((batch, Some(handle)));
        }

        let mut results = Vec::with_capacity(pending.len());
        for (patterns, handle) in pending {
            let outcome = match handle {
                None => BatchOutcome::Skipped,
                Some(handle) => handle.await.unwrap_or_else(|e| BatchOutcome::Failed {
                    reason: format!("Task failed: {}", e),
                }),
            };
            results.push(BatchResult { patterns, outcome });
        }

        let report = InvalidationReport {
            cdn: cdn_name,
            batches: results,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            submitted = report.reference_ids().len(),
            failed = report.failed().count(),
            skipped = report.skipped().count(),
            "Invalidation completed"
        );
        report
    }
}
