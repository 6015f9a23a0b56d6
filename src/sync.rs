//! Syncer: applies a comparison to an object store
//!
//! Uploads every added and modified path, then removes every deleted path.
//! No delete is issued until every upload has completed, so a store never
//! loses an object that the new tree still references. Individual failures
//! are recorded and the run continues.

use crate::compare::Comparison;
use crate::concurrency::{CancelToken, WorkerPool};
use crate::store::{guess_content_type, ContentSource, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Syncer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Maximum store operations in flight at once
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    8
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}

/// Kind of store operation applied to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Put,
    Delete,
}

/// What happened to one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PathOutcome {
    Succeeded,
    Failed { reason: String },
    /// Never issued because the run was cancelled
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResult {
    pub path: String,
    pub operation: SyncOperation,
    pub outcome: PathOutcome,
}

/// Per-path results of a sync run, puts first then deletes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub results: Vec<PathResult>,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &PathResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == PathOutcome::Succeeded)
    }

    pub fn failed(&self) -> impl Iterator<Item = &PathResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, PathOutcome::Failed { .. }))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &PathResult> {
        self.results
            .iter()
            .filter(|r| r.outcome == PathOutcome::Skipped)
    }

    /// True when every operation was issued and succeeded
    pub fn is_success(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.outcome == PathOutcome::Succeeded)
    }

    pub fn result_for(&self, path: &str) -> Option<&PathResult> {
        self.results.iter().find(|r| r.path == path)
    }
}

/// Applies comparisons to an object store through a bounded worker pool
pub struct Syncer {
    store: Arc<dyn ObjectStore>,
    content: Arc<dyn ContentSource>,
    pool: WorkerPool,
}

impl Syncer {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        content: Arc<dyn ContentSource>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            content,
            pool: WorkerPool::new(config.max_concurrent),
        }
    }

    /// Upload added and modified paths, then delete removed ones.
    ///
    /// Once `cancel` fires no new operation is issued; unissued paths are
    /// reported as skipped. Nothing already applied is rolled back.
    #[instrument(skip_all, fields(
        uploads = comparison.added().len() + comparison.modified().len(),
        deletes = comparison.deleted().len(),
    ))]
    pub async fn sync(&self, comparison: &Comparison, cancel: &CancelToken) -> SyncReport {
        let start = Instant::now();
        info!("Starting sync");

        let uploads: Vec<String> = comparison.uploads().cloned().collect();
        let mut results = self.run_phase(SyncOperation::Put, uploads, cancel).await;

        let deletes: Vec<String> = comparison.deleted().iter().cloned().collect();
        if cancel.is_cancelled() {
            debug!(count = deletes.len(), "Cancelled before delete phase");
            results.extend(deletes.into_iter().map(|path| PathResult {
                path,
                operation: SyncOperation::Delete,
                outcome: PathOutcome::Skipped,
            }));
        } else {
            results.extend(self.run_phase(SyncOperation::Delete, deletes, cancel).await);
        }

        let report = SyncReport {
            results,
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            succeeded = report.succeeded().count(),
            failed = report.failed().count(),
            skipped = report.skipped().count(),
            duration_ms = report.duration_ms,
            "Sync completed"
        );
        report
    }

    /// Issue one operation per path and wait for all of them
    async fn run_phase(
        &self,
        operation: SyncOperation,
        paths: Vec<String>,
        cancel: &CancelToken,
    ) -> Vec<PathResult> {
        let mut pending: Vec<(String, Option<JoinHandle<PathOutcome>>)> =
            Vec::with_capacity(paths.len());

        for path in paths {
            let permit = match self.pool.acquire(cancel).await {
                Some(permit) => permit,
                None => {
                    pending.push((path, None));
                    continue;
                }
            };

            let store = Arc::clone(&self.store);
            let content = Arc::clone(&self.content);
            let task_path = path.clone();
            let handle = tokio::spawn(async move {
                let outcome = match operation {
                    SyncOperation::Put => put_one(store.as_ref(), content, &task_path).await,
                    SyncOperation::Delete => delete_one(store.as_ref(), &task_path).await,
                };
                drop(permit);
                outcome
            });
            pending.push((path, Some(handle)));
        }

        let mut results = Vec::with_capacity(pending.len());
        for (path, handle) in pending {
            let outcome = match handle {
                None => PathOutcome::Skipped,
                Some(handle) => handle.await.unwrap_or_else(|e| PathOutcome::Failed {
                    reason: format!("Task failed: {}", e),
                }),
            };
            results.push(PathResult {
                path,
                operation,
                outcome,
            });
        }
        results
    }
}

async fn put_one(
    store: &dyn ObjectStore,
    content: Arc<dyn ContentSource>,
    path: &str,
) -> PathOutcome {
    let key = path.to_string();
    let bytes = match tokio::task::spawn_blocking(move || content.read(&key)).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            warn!(path, error = %e, "Failed to read upload content");
            return PathOutcome::Failed {
                reason: e.to_string(),
            };
        }
        Err(e) => {
            return PathOutcome::Failed {
                reason: format!("Task failed: {}", e),
            }
        }
    };

    let content_type = guess_content_type(path);
    match store.put(path, bytes, &content_type).await {
        Ok(()) => {
            debug!(path, "Uploaded");
            PathOutcome::Succeeded
        }
        Err(e) => {
            warn!(path, error = %e, "Upload failed");
            PathOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}

async fn delete_one(store: &dyn ObjectStore, path: &str) -> PathOutcome {
    match store.delete(path).await {
        Ok(()) => {
            debug!(path, "Deleted");
            PathOutcome::Succeeded
        }
        Err(e) => {
            warn!(path, error = %e, "Delete failed");
            PathOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
