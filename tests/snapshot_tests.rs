//! Snapshot behaviour over real trees

use backup_merger::scanner::snapshot_pair;
use backup_merger::snapshot_tree;
use filetime::FileTime;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn build_tree(root: &Path) {
    for (i, rel) in [
        "a.txt",
        "b/c.txt",
        "b/d/e.bin",
        ".hidden/f",
        "b/.oldversion/c_20240101_000000.txt",
    ]
    .iter()
    .enumerate()
    {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, rel.as_bytes()).unwrap();
        filetime::set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000 + i as i64, 0))
            .unwrap();
    }
    fs::create_dir_all(root.join("empty/nested")).unwrap();
}

#[test]
fn test_snapshot_twice_is_identical() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());

    let first = snapshot_tree(dir.path(), None).unwrap();
    let second = snapshot_tree(dir.path(), None).unwrap();

    assert_eq!(
        first.iter().collect::<Vec<_>>(),
        second.iter().collect::<Vec<_>>()
    );
    assert_eq!(first.len(), 5);
}

#[test]
fn test_snapshot_keys_are_relative_and_exclude_dirs() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());

    let snapshot = snapshot_tree(dir.path(), None).unwrap();
    let keys: Vec<&str> = snapshot.paths().collect();

    assert_eq!(
        keys,
        vec![
            ".hidden/f",
            "a.txt",
            "b/.oldversion/c_20240101_000000.txt",
            "b/c.txt",
            "b/d/e.bin",
        ]
    );
    assert!(!snapshot.contains(""));
    assert!(!snapshot.contains("empty"));
}

#[test]
fn test_snapshot_does_not_modify_tree() {
    let dir = TempDir::new().unwrap();
    build_tree(dir.path());
    let before = snapshot_tree(dir.path(), None).unwrap();

    snapshot_pair(dir.path(), dir.path(), true, None).unwrap();

    let after = snapshot_tree(dir.path(), None).unwrap();
    assert_eq!(before.iter().collect::<Vec<_>>(), after.iter().collect::<Vec<_>>());
    assert!(dir.path().join("empty/nested").is_dir());
}
