//! Directory-backed object store and local content source
//!
//! [`DirectoryStore`] mirrors objects into a directory (a mounted bucket, a
//! staging area, a second checkout). Keys map to nested paths; directories
//! are created on put and pruned on delete, as they carry no meaning of their
//! own. A directory has nowhere to keep a content type, so it is only logged;
//! whatever serves the directory derives it from the extension. Blocking
//! filesystem work runs on the tokio blocking pool.

use crate::error::{ReadError, StoreError};
use crate::store::{ContentSource, ObjectStore};
use crate::tree::path::key_to_path;
use crate::tree::walker::WalkerConfig;
use crate::tree::{Tree, TreeBuilder};
use async_trait::async_trait;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Reads upload content from a local directory
#[derive(Debug, Clone)]
pub struct LocalDirectory {
    root: PathBuf,
}

impl LocalDirectory {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for LocalDirectory {
    fn read(&self, path: &str) -> Result<Vec<u8>, ReadError> {
        let file_path = key_to_path(&self.root, path);
        fs::read(&file_path).map_err(|e| ReadError::io(file_path.display().to_string(), e))
    }
}

/// Suffix of the file an object is written to before it is renamed into place
const STAGING_SUFFIX: &str = ".wood-partial";

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    walker_config: WalkerConfig,
}

impl DirectoryStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            walker_config: WalkerConfig {
                ignore_patterns: Vec::new(),
                ignore_suffixes: vec![STAGING_SUFFIX.to_string()],
                ..WalkerConfig::default()
            },
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> PathBuf {
        key_to_path(&self.root, key)
    }
}

fn store_io(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn write_object(target: &Path, content: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| store_io(parent, e))?;
    }

    // Write then rename so a reader never observes a partial object
    let mut staging = target.as_os_str().to_owned();
    staging.push(STAGING_SUFFIX);
    let staging = PathBuf::from(staging);

    let result = stage_and_rename(&staging, target, content);
    if result.is_err() {
        if let Err(e) = fs::remove_file(&staging) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %staging.display(), error = %e, "Failed to remove staging file");
            }
        }
    }
    result
}

fn stage_and_rename(staging: &Path, target: &Path, content: &[u8]) -> Result<(), StoreError> {
    let mut file = fs::File::create(staging).map_err(|e| store_io(staging, e))?;
    file.write_all(content).map_err(|e| store_io(staging, e))?;
    file.sync_all().map_err(|e| store_io(staging, e))?;
    fs::rename(staging, target).map_err(|e| store_io(target, e))
}

fn remove_object(root: &Path, target: &Path) -> Result<(), StoreError> {
    match fs::remove_file(target) {
        Ok(()) => {}
        // Deleting a missing object succeeds, as in keyed object stores
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %target.display(), "Object already absent");
        }
        Err(e) => return Err(store_io(target, e)),
    }

    let mut dir = target.parent();
    while let Some(current) = dir {
        if current == root || !current.starts_with(root) {
            break;
        }
        // Stops at the first non-empty directory
        if fs::remove_dir(current).is_err() {
            break;
        }
        dir = current.parent();
    }
    Ok(())
}

async fn blocking<T, F>(f: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
}

#[async_trait]
impl ObjectStore for DirectoryStore {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    async fn list(&self) -> Result<Tree, StoreError> {
        if !self.root.exists() {
            debug!("Store root does not exist yet, listing as empty");
            return Ok(Tree::new());
        }
        let builder =
            TreeBuilder::new(self.root.clone()).with_walker_config(self.walker_config.clone());
        blocking(move || builder.build().map_err(StoreError::from)).await
    }

    async fn put(
        &self,
        path: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let target = self.object_path(path);
        debug!(path, bytes = content.len(), content_type, "Directory store put");
        blocking(move || write_object(&target, &content)).await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let root = self.root.clone();
        let target = self.object_path(path);
        debug!(path, "Directory store delete");
        blocking(move || remove_object(&root, &target)).await
    }
}
