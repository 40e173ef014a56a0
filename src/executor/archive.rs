//! `.oldversion` archive naming and lookup
//!
//! Superseded files are kept in a `.oldversion` folder next to the file they
//! came from, renamed to `{stem}_{YYYYMMDD_HHMMSS}{extension}` using the
//! file's own modification time in local time.

use crate::reconcile::files_identical;
use crate::types::{map_file_error, MergeError};
use chrono::{DateTime, Local};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Name of the per-directory archive folder
pub const ARCHIVE_DIR_NAME: &str = ".oldversion";

/// Timestamp layout used in archived names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Archive directory that sits next to `file`
pub fn archive_dir_for(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) => parent.join(ARCHIVE_DIR_NAME),
        None => PathBuf::from(ARCHIVE_DIR_NAME),
    }
}

/// Format an mtime as `YYYYMMDD_HHMMSS` in local time
pub fn format_timestamp(mtime: SystemTime) -> String {
    DateTime::<Local>::from(mtime).format(TIMESTAMP_FORMAT).to_string()
}

/// `{stem}_{YYYYMMDD_HHMMSS}{extension}` for a file name
///
/// ```
/// use backup_merger::executor::archive::archived_name;
/// use std::time::UNIX_EPOCH;
///
/// let name = archived_name("report.tar.gz", UNIX_EPOCH);
/// assert!(name.starts_with("report.tar_"));
/// assert!(name.ends_with(".gz"));
/// ```
pub fn archived_name(file_name: &str, mtime: SystemTime) -> String {
    let (stem, extension) = split_name(file_name);
    format!("{}_{}{}", stem, format_timestamp(mtime), extension)
}

/// Free path in `archive_dir` for an archived copy of `file_name`.
///
/// Uses [`archived_name`] when free. Two versions modified in the same second
/// would collide, so the timestamp is then extended with nanoseconds, and a
/// counter is appended as a last resort. Existing entries are never reused.
pub fn archive_target(archive_dir: &Path, file_name: &str, mtime: SystemTime) -> PathBuf {
    let candidate = archive_dir.join(archived_name(file_name, mtime));
    if !entry_exists(&candidate) {
        return candidate;
    }

    let (stem, extension) = split_name(file_name);
    let precise = DateTime::<Local>::from(mtime)
        .format("%Y%m%d_%H%M%S_%f")
        .to_string();
    let candidate = archive_dir.join(format!("{}_{}{}", stem, precise, extension));
    if !entry_exists(&candidate) {
        return candidate;
    }

    let mut counter = 1u32;
    loop {
        let candidate = archive_dir.join(format!("{}_{}_{}{}", stem, precise, counter, extension));
        if !entry_exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// First regular file in `archive_dir` byte-identical to `candidate`.
///
/// A missing archive directory holds no versions. Entries are checked in
/// name order.
pub fn find_identical_version(
    candidate: &Path,
    archive_dir: &Path,
) -> Result<Option<PathBuf>, MergeError> {
    let read_dir = match fs::read_dir(archive_dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(map_file_error(archive_dir, e)),
    };

    let mut versions = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| map_file_error(archive_dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| map_file_error(&entry.path(), e))?;
        if file_type.is_file() {
            versions.push(entry.path());
        }
    }
    versions.sort();

    for version in versions {
        if files_identical(candidate, &version)? {
            return Ok(Some(version));
        }
    }
    Ok(None)
}

/// Split like `stem` + `.ext`; a leading dot alone is not an extension.
fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(0) | None => (file_name, ""),
        Some(idx) => file_name.split_at(idx),
    }
}

fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn local_time(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> SystemTime {
        Local
            .with_ymd_and_hms(y, mo, d, h, mi, s)
            .single()
            .expect("unambiguous local time")
            .into()
    }

    #[test]
    fn test_archive_dir_is_sibling() {
        assert_eq!(
            archive_dir_for(Path::new("/backup/subdir1/file4.txt")),
            PathBuf::from("/backup/subdir1/.oldversion")
        );
    }

    #[test]
    fn test_archived_name_format() {
        let mtime = local_time(2023, 4, 5, 6, 7, 8);
        assert_eq!(archived_name("file1.txt", mtime), "file1_20230405_060708.txt");
    }

    #[test]
    fn test_archived_name_without_extension() {
        let mtime = local_time(2023, 12, 31, 23, 59, 59);
        assert_eq!(archived_name("Makefile", mtime), "Makefile_20231231_235959");
        assert_eq!(archived_name(".bashrc", mtime), ".bashrc_20231231_235959");
    }

    #[test]
    fn test_archived_name_keeps_only_last_extension() {
        let mtime = local_time(2023, 1, 2, 3, 4, 5);
        assert_eq!(
            archived_name("backup.tar.gz", mtime),
            "backup.tar_20230102_030405.gz"
        );
    }

    #[test]
    fn test_archive_target_avoids_collisions() {
        let dir = TempDir::new().unwrap();
        let mtime = local_time(2023, 4, 5, 6, 7, 8);

        let first = archive_target(dir.path(), "file.txt", mtime);
        assert_eq!(first, dir.path().join("file_20230405_060708.txt"));
        fs::write(&first, b"v1").unwrap();

        let second = archive_target(dir.path(), "file.txt", mtime);
        assert_eq!(second, dir.path().join("file_20230405_060708_000000000.txt"));
        fs::write(&second, b"v2").unwrap();

        let third = archive_target(dir.path(), "file.txt", mtime);
        assert_eq!(third, dir.path().join("file_20230405_060708_000000000_1.txt"));
    }

    #[test]
    fn test_find_identical_version_in_missing_dir() {
        let dir = TempDir::new().unwrap();
        let candidate = dir.path().join("c.txt");
        fs::write(&candidate, b"content").unwrap();

        let found = find_identical_version(&candidate, &dir.path().join(ARCHIVE_DIR_NAME)).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_find_identical_version_matches_any_name() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join(ARCHIVE_DIR_NAME);
        fs::create_dir(&archive).unwrap();
        fs::write(archive.join("a_20200101_000000.txt"), b"other").unwrap();
        fs::write(archive.join("zzz_unrelated.bin"), b"content").unwrap();
        fs::create_dir(archive.join("nested")).unwrap();

        let candidate = dir.path().join("c.txt");
        fs::write(&candidate, b"content").unwrap();

        let found = find_identical_version(&candidate, &archive).unwrap();
        assert_eq!(found, Some(archive.join("zzz_unrelated.bin")));
    }

    #[test]
    fn test_find_identical_version_none_when_unique() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join(ARCHIVE_DIR_NAME);
        fs::create_dir(&archive).unwrap();
        fs::write(archive.join("a_20200101_000000.txt"), b"v1").unwrap();

        let candidate = dir.path().join("a.txt");
        fs::write(&candidate, b"v2").unwrap();

        assert_eq!(find_identical_version(&candidate, &archive).unwrap(), None);
    }
}
