//! CDN stand-in that records instead of submitting

use crate::cdn::CdnInvalidator;
use crate::error::InvalidationError;
use crate::invalidation::InvalidationPattern;
use crate::types::ReferenceId;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

/// Logs every batch and returns synthetic reference IDs `dry-run-<n>`
#[derive(Debug)]
pub struct DryRunInvalidator {
    name: String,
    max_patterns_per_request: usize,
    submitted: Mutex<Vec<Vec<InvalidationPattern>>>,
}

impl DryRunInvalidator {
    pub fn new(name: impl Into<String>, max_patterns_per_request: usize) -> Self {
        Self {
            name: name.into(),
            max_patterns_per_request: max_patterns_per_request.max(1),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Batches received so far, in submission order
    pub fn submitted(&self) -> Vec<Vec<InvalidationPattern>> {
        self.submitted.lock().clone()
    }
}

impl Default for DryRunInvalidator {
    fn default() -> Self {
        Self::new("dry-run", 1000)
    }
}

#[async_trait]
impl CdnInvalidator for DryRunInvalidator {
    async fn invalidate(
        &self,
        patterns: &[InvalidationPattern],
    ) -> Result<ReferenceId, InvalidationError> {
        if patterns.is_empty() {
            return Err(InvalidationError::EmptyBatch);
        }
        let mut submitted = self.submitted.lock();
        submitted.push(patterns.to_vec());
        let reference = format!("dry-run-{}", submitted.len());
        info!(
            cdn = %self.name,
            reference = %reference,
            patterns = %patterns.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            "Dry-run invalidation"
        );
        Ok(reference)
    }

    fn max_patterns_per_request(&self) -> usize {
        self.max_patterns_per_request
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}
