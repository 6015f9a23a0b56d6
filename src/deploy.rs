//! End-to-end deployment
//!
//! Builds the local tree, lists the store, compares the two, then syncs the
//! store and invalidates every configured CDN from the same comparison.

use crate::cdn::CdnInvalidator;
use crate::compare::{compare, Comparison, ComparisonSummary};
use crate::concurrency::CancelToken;
use crate::error::ApiError;
use crate::invalidation::{
    AggregationConfig, Aggregator, InvalidationPattern, InvalidationReport, Invalidator,
    InvalidatorConfig,
};
use crate::store::{LocalDirectory, ObjectStore};
use crate::sync::{SyncConfig, SyncReport, Syncer};
use crate::tree::path::canonicalize_root;
use crate::tree::walker::WalkerConfig;
use crate::tree::{Tree, TreeBuilder};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// When invalidation runs relative to the store sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployOrdering {
    /// Invalidate once the sync has finished, so CDNs refetch new objects
    #[default]
    Sequential,
    /// Sync and invalidate at the same time
    Concurrent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub ordering: DeployOrdering,
    /// Compute the comparison and patterns without touching store or CDNs
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub walker: WalkerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub invalidator: InvalidatorConfig,
}

/// What a deployment would do
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub comparison: Comparison,
    pub patterns: Vec<InvalidationPattern>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployReport {
    pub started_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub comparison: Option<ComparisonSummary>,
    pub patterns: Vec<InvalidationPattern>,
    pub sync: SyncReport,
    pub invalidations: Vec<InvalidationReport>,
    pub duration_ms: u64,
}

impl DeployReport {
    /// True when any store operation or invalidation batch failed or was skipped
    pub fn has_failures(&self) -> bool {
        !self.sync.is_success() || self.invalidations.iter().any(|r| !r.is_success())
    }
}

pub struct Deployment {
    local_root: PathBuf,
    store: Arc<dyn ObjectStore>,
    cdns: Vec<Arc<dyn CdnInvalidator>>,
    config: DeployConfig,
}

impl Deployment {
    pub fn new(
        local_root: PathBuf,
        store: Arc<dyn ObjectStore>,
        cdns: Vec<Arc<dyn CdnInvalidator>>,
        config: DeployConfig,
    ) -> Self {
        Self {
            local_root,
            store,
            cdns,
            config,
        }
    }

    pub fn config(&self) -> &DeployConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut DeployConfig {
        &mut self.config
    }

    async fn local_tree(&self) -> Result<Tree, ApiError> {
        let builder = TreeBuilder::new(self.local_root.clone())
            .with_walker_config(self.config.walker.clone());
        let tree = tokio::task::spawn_blocking(move || builder.build())
            .await
            .map_err(|e| ApiError::Runtime(format!("Tree build task failed: {}", e)))??;
        Ok(tree)
    }

    /// Compare local and remote trees and aggregate patterns, with no side effects
    #[instrument(skip(self), fields(root = %self.local_root.display()))]
    pub async fn plan(&self) -> Result<DeployPlan, ApiError> {
        let local = self.local_tree().await?;
        let remote = self.store.list().await?;
        let comparison = compare(&remote, &local);
        let patterns =
            Aggregator::new(self.config.aggregation.clone()).aggregate_comparison(&comparison)?;

        info!(
            added = comparison.added().len(),
            modified = comparison.modified().len(),
            deleted = comparison.deleted().len(),
            unchanged = comparison.unchanged().len(),
            patterns = patterns.len(),
            "Deployment planned"
        );
        Ok(DeployPlan {
            comparison,
            patterns,
        })
    }

    /// Plan, then apply the plan to the store and CDNs.
    ///
    /// Only tree construction, store listing and aggregation defects abort
    /// the run. Individual store and CDN failures are recorded in the report.
    pub async fn run(&self, cancel: &CancelToken) -> Result<DeployReport, ApiError> {
        let start = Instant::now();
        let started_at = Utc::now();
        let plan = self.plan().await?;

        let mut report = DeployReport {
            started_at: Some(started_at),
            dry_run: self.config.dry_run,
            comparison: Some(plan.comparison.summary()),
            patterns: plan.patterns.clone(),
            ..DeployReport::default()
        };
        if self.config.dry_run {
            info!("Dry run, skipping sync and invalidation");
            report.duration_ms = start.elapsed().as_millis() as u64;
            return Ok(report);
        }

        let content = Arc::new(LocalDirectory::new(canonicalize_root(&self.local_root)?));
        let syncer = Syncer::new(Arc::clone(&self.store), content, self.config.sync.clone());

        match self.config.ordering {
            DeployOrdering::Sequential => {
                report.sync = syncer.sync(&plan.comparison, cancel).await;
                report.invalidations = self.invalidate_all(&plan.patterns, cancel).await;
            }
            DeployOrdering::Concurrent => {
                let (sync, invalidations) = tokio::join!(
                    syncer.sync(&plan.comparison, cancel),
                    self.invalidate_all(&plan.patterns, cancel)
                );
                report.sync = sync;
                report.invalidations = invalidations;
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        if report.has_failures() {
            warn!(duration_ms = report.duration_ms, "Deployment finished with failures");
        } else {
            info!(duration_ms = report.duration_ms, "Deployment finished");
        }
        Ok(report)
    }

    async fn invalidate_all(
        &self,
        patterns: &[InvalidationPattern],
        cancel: &CancelToken,
    ) -> Vec<InvalidationReport> {
        if patterns.is_empty() {
            return Vec::new();
        }
        let runs = self.cdns.iter().map(|cdn| {
            let invalidator =
                Invalidator::new(Arc::clone(cdn), self.config.invalidator.clone());
            async move { invalidator.invalidate(patterns, cancel).await }
        });
        join_all(runs).await
    }
}
