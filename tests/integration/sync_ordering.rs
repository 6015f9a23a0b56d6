//! Integration tests for store sync ordering and outcomes

use super::test_utils::write_files;
use std::sync::Arc;
use tempfile::TempDir;
use wood::compare::compare;
use wood::concurrency::CancelToken;
use wood::store::{
    DirectoryStore, LocalDirectory, MemoryStore, ObjectStore, StoreOperation,
};
use wood::sync::{PathOutcome, SyncConfig, SyncOperation, Syncer};
use wood::tree::{Tree, TreeBuilder};

fn local_site(files: &[(&str, &str)]) -> (TempDir, Tree) {
    let temp_dir = TempDir::new().unwrap();
    write_files(temp_dir.path(), files);
    let tree = TreeBuilder::new(temp_dir.path().to_path_buf())
        .build()
        .unwrap();
    (temp_dir, tree)
}

/// Every put lands before the first delete, regardless of pool size
#[tokio::test]
async fn test_puts_complete_before_deletes() {
    let (local_dir, local) = local_site(&[
        ("a.txt", "a2"),
        ("b/c.txt", "c"),
        ("b/d.txt", "d"),
        ("e.txt", "e"),
    ]);
    let store = Arc::new(MemoryStore::with_objects(vec![
        ("a.txt", "a1"),
        ("old1.txt", "x"),
        ("old/2.txt", "y"),
    ]));
    let remote = store.list().await.unwrap();
    let comparison = compare(&remote, &local);

    let syncer = Syncer::new(
        store.clone(),
        Arc::new(LocalDirectory::new(local_dir.path().to_path_buf())),
        SyncConfig { max_concurrent: 3 },
    );
    let report = syncer.sync(&comparison, &CancelToken::new()).await;

    assert!(report.is_success());
    let journal = store.journal();
    assert_eq!(journal.len(), 6);
    let first_delete = journal
        .iter()
        .position(|op| matches!(op, StoreOperation::Delete(_)))
        .unwrap();
    assert_eq!(first_delete, 4);
    assert!(journal[first_delete..]
        .iter()
        .all(|op| matches!(op, StoreOperation::Delete(_))));
}

/// Syncing into a directory store makes a second comparison empty
#[tokio::test]
async fn test_directory_store_converges() {
    let (local_dir, local) = local_site(&[
        ("index.html", "<html/>"),
        ("assets/app.js", "console.log(1)"),
    ]);
    let bucket = TempDir::new().unwrap();
    write_files(bucket.path(), &[("gone/old.css", "x")]);
    let store = Arc::new(DirectoryStore::new(bucket.path().to_path_buf()));

    let comparison = compare(&store.list().await.unwrap(), &local);
    assert_eq!(comparison.change_count(), 3);

    let syncer = Syncer::new(
        store.clone(),
        Arc::new(LocalDirectory::new(local_dir.path().to_path_buf())),
        SyncConfig::default(),
    );
    let report = syncer.sync(&comparison, &CancelToken::new()).await;
    assert!(report.is_success());

    let after = compare(&store.list().await.unwrap(), &local);
    assert!(after.is_empty());
    assert!(!bucket.path().join("gone").exists());
}

/// A missing local file fails that put only
#[tokio::test]
async fn test_unreadable_file_fails_one_path() {
    let (local_dir, local) = local_site(&[("keep.txt", "k"), ("vanish.txt", "v")]);
    std::fs::remove_file(local_dir.path().join("vanish.txt")).unwrap();

    let store = Arc::new(MemoryStore::new());
    let comparison = compare(&Tree::new(), &local);
    let syncer = Syncer::new(
        store.clone(),
        Arc::new(LocalDirectory::new(local_dir.path().to_path_buf())),
        SyncConfig::default(),
    );
    let report = syncer.sync(&comparison, &CancelToken::new()).await;

    assert_eq!(report.succeeded().count(), 1);
    let failed = report.result_for("vanish.txt").unwrap();
    assert_eq!(failed.operation, SyncOperation::Put);
    assert!(matches!(failed.outcome, PathOutcome::Failed { .. }));
    assert_eq!(store.get("keep.txt"), Some(b"k".to_vec()));
}

/// A run cancelled up front issues nothing
#[tokio::test]
async fn test_cancelled_run_skips_everything() {
    let (local_dir, local) = local_site(&[("a.txt", "a")]);
    let store = Arc::new(MemoryStore::with_objects(vec![("b.txt", "b")]));
    let comparison = compare(&store.list().await.unwrap(), &local);

    let cancel = CancelToken::new();
    cancel.cancel();
    let syncer = Syncer::new(
        store.clone(),
        Arc::new(LocalDirectory::new(local_dir.path().to_path_buf())),
        SyncConfig::default(),
    );
    let report = syncer.sync(&comparison, &cancel).await;

    assert_eq!(report.skipped().count(), 2);
    assert!(store.journal().is_empty());
    assert_eq!(store.get("b.txt"), Some(b"b".to_vec()));
}
