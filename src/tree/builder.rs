//! Tree builder for constructing content-addressed file trees

use crate::error::ReadError;
use crate::tree::entry::PathEntry;
use crate::tree::hasher;
use crate::tree::path;
use crate::tree::walker::{WalkedFile, Walker, WalkerConfig};
use std::collections::btree_map::{self, BTreeMap};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument, trace};

/// Mapping from normalized relative path to entry.
///
/// Keys are unique. A tree has no mutating API once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<String, PathEntry>,
}

impl Tree {
    /// An empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Adapt a listing of already-fingerprinted entries, e.g. a remote store
    /// listing. Keys are normalized; duplicates are rejected.
    pub fn from_entries<I>(entries: I) -> Result<Self, ReadError>
    where
        I: IntoIterator<Item = PathEntry>,
    {
        let mut map = BTreeMap::new();
        for entry in entries {
            let key = path::normalize_key(entry.path())?;
            let entry = if key == entry.path() {
                entry
            } else {
                PathEntry::new(key.clone(), *entry.fingerprint(), entry.size())
            };
            insert_unique(&mut map, key, entry)?;
        }
        Ok(Self { entries: map })
    }

    /// Build a tree from `(path, content)` pairs, fingerprinting each content.
    pub fn from_contents<I, P, C>(contents: I) -> Result<Self, ReadError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<[u8]>,
    {
        let mut map = BTreeMap::new();
        for (raw_path, content) in contents {
            let key = path::normalize_key(raw_path.as_ref())?;
            let bytes = content.as_ref();
            let entry = PathEntry::new(
                key.clone(),
                hasher::compute_content_hash(bytes),
                bytes.len() as u64,
            );
            insert_unique(&mut map, key, entry)?;
        }
        Ok(Self { entries: map })
    }

    pub fn get(&self, path: &str) -> Option<&PathEntry> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> btree_map::Values<'_, String, PathEntry> {
        self.entries.values()
    }

    /// Iterate keys in order
    pub fn paths(&self) -> btree_map::Keys<'_, String, PathEntry> {
        self.entries.keys()
    }

    /// Sum of entry sizes in bytes
    pub fn total_size(&self) -> u64 {
        self.entries.values().map(PathEntry::size).sum()
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a PathEntry;
    type IntoIter = btree_map::Values<'a, String, PathEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

fn insert_unique(
    map: &mut BTreeMap<String, PathEntry>,
    key: String,
    entry: PathEntry,
) -> Result<(), ReadError> {
    match map.entry(key) {
        btree_map::Entry::Occupied(occupied) => {
            Err(ReadError::DuplicatePath(occupied.key().clone()))
        }
        btree_map::Entry::Vacant(vacant) => {
            vacant.insert(entry);
            Ok(())
        }
    }
}

/// Tree builder for local directories
pub struct TreeBuilder {
    root: PathBuf,
    walker_config: Option<WalkerConfig>,
}

impl TreeBuilder {
    /// Create a new tree builder for the given root path
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            walker_config: None,
        }
    }

    /// Set walker config (ignore patterns, etc.). When set, the walker uses this config
    /// instead of the default.
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = Some(config);
        self
    }

    /// Walk the root and fingerprint every file.
    ///
    /// Fails with [`ReadError`] if any file cannot be fully read; no partial
    /// tree is ever returned.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn build(&self) -> Result<Tree, ReadError> {
        let start = Instant::now();
        info!("Starting tree build");

        let root = path::canonicalize_root(&self.root)?;

        let walker = match &self.walker_config {
            Some(config) => Walker::with_config(root.clone(), config.clone()),
            None => Walker::new(root.clone()),
        };
        let files = match walker.walk() {
            Ok(f) => {
                debug!(file_count = f.len(), "Walked filesystem");
                f
            }
            Err(e) => {
                error!("Filesystem walk failed: {}", e);
                return Err(e);
            }
        };

        let mut entries = BTreeMap::new();
        for file in files {
            let (key, entry) = self.hash_file(&root, &file)?;
            insert_unique(&mut entries, key, entry)?;
        }

        let tree = Tree { entries };
        info!(
            file_count = tree.len(),
            total_bytes = tree.total_size(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tree build completed"
        );

        Ok(tree)
    }

    #[instrument(skip(self, root, file), fields(path = %file.path.display()))]
    fn hash_file(&self, root: &Path, file: &WalkedFile) -> Result<(String, PathEntry), ReadError> {
        let key = path::relative_key(root, &file.path)?;
        let (fingerprint, size) = hasher::hash_file(&file.path).map_err(|e| {
            error!("Failed to read file: {}", e);
            e
        })?;
        trace!(fingerprint = %hex::encode(fingerprint), size, "Fingerprinted file");

        Ok((key.clone(), PathEntry::new(key, fingerprint, size)))
    }
}
