//! In-memory object store
//!
//! Used for dry runs and tests. Every successful put and delete is appended
//! to a journal so callers can audit the order in which operations landed.

use crate::error::{ReadError, StoreError};
use crate::store::{guess_content_type, ContentSource, ObjectStore};
use crate::tree::Tree;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// One applied store operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOperation {
    Put(String),
    Delete(String),
}

#[derive(Debug, Clone)]
struct StoredObject {
    content: Vec<u8>,
    content_type: String,
}

/// Thread-safe in-memory object store
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
    journal: RwLock<Vec<StoreOperation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `(path, content)` pairs
    pub fn with_objects<I, P, C>(objects: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let objects = objects
            .into_iter()
            .map(|(p, c)| {
                let path: String = p.into();
                let object = StoredObject {
                    content: c.into(),
                    content_type: guess_content_type(&path),
                };
                (path, object)
            })
            .collect();
        Self {
            objects: RwLock::new(objects),
            journal: RwLock::new(Vec::new()),
        }
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().get(path).map(|o| o.content.clone())
    }

    /// Content type the object at `path` was stored with
    pub fn content_type(&self, path: &str) -> Option<String> {
        self.objects.read().get(path).map(|o| o.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Operations applied so far, in completion order
    pub fn journal(&self) -> Vec<StoreOperation> {
        self.journal.read().clone()
    }

    /// Snapshot of the current contents as a tree
    pub fn snapshot(&self) -> Result<Tree, ReadError> {
        let objects = self.objects.read();
        Tree::from_contents(
            objects
                .iter()
                .map(|(k, v)| (k.as_str(), v.content.as_slice())),
        )
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self) -> Result<Tree, StoreError> {
        Ok(self.snapshot()?)
    }

    async fn put(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        debug!(path, bytes = content.len(), content_type, "Memory store put");
        self.objects.write().insert(
            path.to_string(),
            StoredObject {
                content,
                content_type: content_type.to_string(),
            },
        );
        self.journal.write().push(StoreOperation::Put(path.to_string()));
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        debug!(path, "Memory store delete");
        self.objects.write().remove(path);
        self.journal
            .write()
            .push(StoreOperation::Delete(path.to_string()));
        Ok(())
    }
}

impl ContentSource for MemoryStore {
    fn read(&self, path: &str) -> Result<Vec<u8>, ReadError> {
        self.get(path).ok_or_else(|| {
            ReadError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "no such object"),
            )
        })
    }
}
