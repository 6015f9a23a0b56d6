//! Key prefix within a shared store
//!
//! [`PrefixedStore`] confines any store to the keys below one directory, so
//! several sites can share a bucket. Tree keys stay relative to the prefix;
//! objects outside it are neither listed nor touched.

use crate::error::{ReadError, StoreError};
use crate::store::ObjectStore;
use crate::tree::path::normalize_served_key;
use crate::tree::{PathEntry, Tree};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct PrefixedStore {
    inner: Arc<dyn ObjectStore>,
    prefix: String,
}

impl PrefixedStore {
    /// Wrap `inner` so every key lives below `prefix`.
    ///
    /// The prefix is normalized like a key; `/site/` and `site` are the same.
    pub fn new(inner: Arc<dyn ObjectStore>, prefix: &str) -> Result<Self, ReadError> {
        Ok(Self {
            inner,
            prefix: normalize_served_key(prefix)?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, path: &str) -> String {
        format!("{}/{}", self.prefix, path)
    }

    fn strip<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.prefix.as_str())?.strip_prefix('/')
    }
}

#[async_trait]
impl ObjectStore for PrefixedStore {
    async fn list(&self) -> Result<Tree, StoreError> {
        let listing = self.inner.list().await?;
        let entries: Vec<PathEntry> = listing
            .iter()
            .filter_map(|entry| {
                self.strip(entry.path())
                    .map(|path| PathEntry::new(path, *entry.fingerprint(), entry.size()))
            })
            .collect();
        debug!(
            prefix = %self.prefix,
            listed = listing.len(),
            kept = entries.len(),
            "Listed prefixed store"
        );
        Ok(Tree::from_entries(entries)?)
    }

    async fn put(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.inner.put(&self.key(path), content, content_type).await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.inner.delete(&self.key(path)).await
    }
}
