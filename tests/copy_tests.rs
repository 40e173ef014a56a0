//! Tests for the copy path used by `--keep-source` and cross-device moves

use backup_merger::executor::{copy_file_atomic, Executor, TransferMode};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn create_test_file(path: &Path, content: &[u8], mtime: SystemTime) {
    fs::write(path, content).expect("Failed to write test file");
    filetime::set_file_mtime(path, FileTime::from_system_time(mtime)).expect("Failed to set mtime");
}

fn mtime_secs(path: &Path) -> i64 {
    let modified = fs::metadata(path)
        .expect("Failed to read metadata")
        .modified()
        .expect("Failed to read mtime");
    FileTime::from_system_time(modified).unix_seconds()
}

#[test]
fn test_copy_into_new_archive_dir() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("report.txt");
    let content = b"quarterly numbers";
    create_test_file(&src_path, content, SystemTime::now());

    let dest_path = root.join("backup/sub/.oldversion/report_20240101_120000.txt");
    let bytes_copied = copy_file_atomic(&src_path, &dest_path).expect("copy should succeed");

    assert_eq!(bytes_copied, content.len() as u64);
    assert_eq!(fs::read(&dest_path).unwrap(), content);
    assert!(src_path.exists());
}

#[test]
fn test_copy_preserves_mtime() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("old.txt");
    let mtime = SystemTime::now() - Duration::from_secs(3 * 24 * 3600);
    create_test_file(&src_path, b"old", mtime);

    let dest_path = root.join("copy.txt");
    copy_file_atomic(&src_path, &dest_path).expect("copy should succeed");

    assert_eq!(mtime_secs(&dest_path), mtime_secs(&src_path));
}

#[test]
fn test_copy_leaves_no_part_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("a.txt");
    create_test_file(&src_path, b"a", SystemTime::now());
    let dest_path = root.join("out/a.txt");

    copy_file_atomic(&src_path, &dest_path).expect("copy should succeed");

    let names: Vec<String> = fs::read_dir(root.join("out"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.txt".to_string()]);
}

#[test]
fn test_copy_missing_source_cleans_up() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();
    let dest_dir = root.join("out");

    let err = copy_file_atomic(&root.join("missing.txt"), &dest_dir.join("missing.txt"))
        .expect_err("copy of a missing file must fail");

    assert!(err.to_string().contains("missing.txt"));
    assert_eq!(fs::read_dir(&dest_dir).unwrap().count(), 0);
}

#[test]
fn test_copy_large_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("large.bin");
    let size = 1024 * 1024 + 17;
    let content: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    create_test_file(&src_path, &content, SystemTime::now());

    let dest_path = root.join("large_copy.bin");
    let bytes_copied = copy_file_atomic(&src_path, &dest_path).expect("copy should succeed");

    assert_eq!(bytes_copied, size as u64);
    assert_eq!(fs::read(&dest_path).unwrap(), content);
}

#[cfg(unix)]
#[test]
fn test_copy_preserves_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("readonly.txt");
    create_test_file(&src_path, b"locked", SystemTime::now());
    fs::set_permissions(&src_path, fs::Permissions::from_mode(0o444)).unwrap();

    let dest_path = root.join("copy.txt");
    copy_file_atomic(&src_path, &dest_path).expect("copy should succeed");

    let mode = fs::metadata(&dest_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o444);
}

#[test]
fn test_copy_mode_transfer_keeps_mtime_for_later_comparisons() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let root = temp_dir.path();

    let src_path = root.join("photo.jpg");
    let mtime = SystemTime::now() - Duration::from_secs(7200);
    create_test_file(&src_path, b"jpeg bytes", mtime);

    let dest_path = root.join("backup/photo.jpg");
    Executor::new(false, TransferMode::Copy)
        .transfer(&src_path, &dest_path)
        .expect("transfer should succeed");

    assert!(src_path.exists());
    assert_eq!(mtime_secs(&dest_path), mtime_secs(&src_path));
}
