//! Integration tests for tree building determinism

use super::test_utils::write_files;
use std::fs;
use tempfile::TempDir;
use wood::tree::hasher::compute_content_hash;
use wood::tree::TreeBuilder;

/// Same directory builds the same tree twice
#[test]
fn test_same_filesystem_same_tree() {
    let temp_dir = TempDir::new().unwrap();
    write_files(
        temp_dir.path(),
        &[
            ("file1.txt", "content1"),
            ("file2.txt", "content2"),
            ("dir1/file3.txt", "content3"),
        ],
    );

    let builder = TreeBuilder::new(temp_dir.path().to_path_buf());
    let first = builder.build().unwrap();
    let second = builder.build().unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first.paths().cloned().collect::<Vec<_>>(),
        vec!["dir1/file3.txt", "file1.txt", "file2.txt"]
    );
}

/// Fingerprints depend on content only, not on path or timestamps
#[test]
fn test_fingerprint_ignores_path_and_mtime() {
    let temp_dir = TempDir::new().unwrap();
    write_files(temp_dir.path(), &[("a.txt", "same"), ("deep/b.txt", "same")]);

    let tree = TreeBuilder::new(temp_dir.path().to_path_buf())
        .build()
        .unwrap();
    let a = tree.get("a.txt").unwrap();
    let b = tree.get("deep/b.txt").unwrap();
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(*a.fingerprint(), compute_content_hash(b"same"));

    // Rewriting identical bytes bumps mtime only
    fs::write(temp_dir.path().join("a.txt"), "same").unwrap();
    let rebuilt = TreeBuilder::new(temp_dir.path().to_path_buf())
        .build()
        .unwrap();
    assert_eq!(tree, rebuilt);
}

/// Content changes change exactly the affected fingerprint
#[test]
fn test_content_change_changes_one_entry() {
    let temp_dir = TempDir::new().unwrap();
    write_files(temp_dir.path(), &[("a.txt", "one"), ("b.txt", "two")]);

    let builder = TreeBuilder::new(temp_dir.path().to_path_buf());
    let before = builder.build().unwrap();
    fs::write(temp_dir.path().join("a.txt"), "three").unwrap();
    let after = builder.build().unwrap();

    assert_ne!(before.get("a.txt"), after.get("a.txt"));
    assert_eq!(before.get("b.txt"), after.get("b.txt"));
}

/// Empty files and empty directories
#[test]
fn test_empty_files_and_directories() {
    let temp_dir = TempDir::new().unwrap();
    write_files(temp_dir.path(), &[("empty.txt", "")]);
    fs::create_dir_all(temp_dir.path().join("nothing/here")).unwrap();

    let tree = TreeBuilder::new(temp_dir.path().to_path_buf())
        .build()
        .unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree.get("empty.txt").unwrap().size(), 0);
}

/// Decomposed Unicode file names become NFC keys
#[test]
fn test_keys_are_nfc() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("cafe\u{301}.txt"), "x").unwrap();

    let tree = TreeBuilder::new(temp_dir.path().to_path_buf())
        .build()
        .unwrap();
    assert!(tree.contains("caf\u{e9}.txt"));
}

#[test]
fn test_missing_root_fails() {
    let temp_dir = TempDir::new().unwrap();
    let result = TreeBuilder::new(temp_dir.path().join("missing")).build();
    assert!(result.is_err());
}
