//! Atomic file copy implementation

use crate::types::{map_file_error, MergeError};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Copy a file atomically using the write-then-rename strategy
///
/// 1. Write to a hidden `.{name}.part` sibling of `dest`
/// 2. Flush and sync to disk
/// 3. Preserve permissions and mtime
/// 4. Rename over the final destination
///
/// Returns the number of bytes copied. The `.part` file is removed if any
/// step fails.
///
/// # Example
/// ```no_run
/// use backup_merger::executor::copy_file_atomic;
/// use std::path::Path;
///
/// let bytes = copy_file_atomic(Path::new("source.txt"), Path::new("backup/source.txt"))?;
/// # Ok::<(), backup_merger::MergeError>(())
/// ```
pub fn copy_file_atomic(src: &Path, dest: &Path) -> Result<u64, MergeError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(|e| map_file_error(parent, e))?;
    }

    let part_path = part_path_for(dest);
    let result = write_part(src, &part_path).and_then(|bytes| {
        fs::rename(&part_path, dest).map_err(|e| map_file_error(dest, e))?;
        Ok(bytes)
    });

    if result.is_err() {
        let _ = fs::remove_file(&part_path);
    }
    result
}

fn write_part(src: &Path, part_path: &Path) -> Result<u64, MergeError> {
    let mut src_file = File::open(src).map_err(|e| map_file_error(src, e))?;
    let mut part_file = File::create(part_path).map_err(|e| map_file_error(part_path, e))?;

    let mut buffer = vec![0u8; 128 * 1024];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = src_file
            .read(&mut buffer)
            .map_err(|e| map_file_error(src, e))?;
        if bytes_read == 0 {
            break;
        }
        part_file
            .write_all(&buffer[..bytes_read])
            .map_err(|e| map_file_error(part_path, e))?;
        total_bytes += bytes_read as u64;
    }

    part_file
        .sync_all()
        .map_err(|e| map_file_error(part_path, e))?;
    // Windows refuses to rename an open file
    drop(part_file);

    let src_metadata = fs::metadata(src).map_err(|e| map_file_error(src, e))?;
    fs::set_permissions(part_path, src_metadata.permissions())
        .map_err(|e| map_file_error(part_path, e))?;

    let mtime = src_metadata.modified().map_err(|e| map_file_error(src, e))?;
    filetime::set_file_mtime(part_path, filetime::FileTime::from_system_time(mtime))
        .map_err(|e| map_file_error(part_path, e))?;

    Ok(total_bytes)
}

fn part_path_for(dest: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dest.file_name().unwrap_or_default());
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_path_is_hidden_sibling() {
        assert_eq!(
            part_path_for(Path::new("/backup/sub/file1.txt")),
            PathBuf::from("/backup/sub/.file1.txt.part")
        );
    }
}
