//! Object store capability
//!
//! The syncer depends only on these traits. Any backend that can list, put
//! and delete keyed objects plugs in without the core naming a concrete
//! provider. Retry, backoff and authentication belong to the implementation.
//! Every upload carries a content type guessed from its key.

pub mod directory;
pub mod memory;
pub mod prefixed;

pub use directory::{DirectoryStore, LocalDirectory};
pub use memory::{MemoryStore, StoreOperation};
pub use prefixed::PrefixedStore;

use crate::error::{ReadError, StoreError};
use crate::tree::Tree;
use async_trait::async_trait;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Remote object store holding the deployed tree
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object as a tree of fingerprinted entries
    async fn list(&self) -> Result<Tree, StoreError>;

    /// Write `content` under `path` with the given MIME type, replacing any
    /// existing object
    async fn put(&self, path: &str, content: Vec<u8>, content_type: &str)
        -> Result<(), StoreError>;

    /// Remove the object at `path`
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}

/// Source of the bytes to upload for a path of the target tree
#[cfg_attr(test, automock)]
pub trait ContentSource: Send + Sync {
    fn read(&self, path: &str) -> Result<Vec<u8>, ReadError>;
}

/// Served when no type can be guessed from the key
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// MIME type for an object key, from its extension
pub fn guess_content_type(path: &str) -> String {
    match mime_guess::from_path(path).first_raw() {
        Some(mime) => mime.to_string(),
        None => {
            debug!(path, "No content type for key, using {}", DEFAULT_CONTENT_TYPE);
            DEFAULT_CONTENT_TYPE.to_string()
        }
    }
}
