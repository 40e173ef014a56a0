//! Tree snapshotter built on the `ignore` walker

use crate::types::{map_file_error, MergeError, TreeSnapshot, KEY_SEPARATOR};
use std::fs;
use std::path::{Component, Path};
use std::thread;
use std::time::Instant;
use tracing::{debug, warn};

/// Callback for reporting scan progress (files scanned so far)
pub type ProgressCallback<'a> = dyn Fn(u64) + Send + Sync + 'a;

/// Callback for reporting progress of a paired scan (tree label, files scanned)
pub type PairProgressCallback<'a> = dyn Fn(&'static str, u64) + Send + Sync + 'a;

/// Snapshot every regular file below `root_path`.
///
/// All ignore-file and hidden-file filtering is disabled and links are not
/// followed. Symlinks and special files are recorded in `skipped` rather than
/// keyed.
///
/// # Errors
/// * The root is missing, not a directory or unreadable
/// * Any entry below the root cannot be read or has a non-UTF-8 name
///
/// Per-entry errors abort instead of being skipped: the source tree is removed
/// wholesale after a merge, so a file missing from its snapshot would be lost.
pub fn snapshot_tree(
    root_path: &Path,
    on_progress: Option<&ProgressCallback>,
) -> Result<TreeSnapshot, MergeError> {
    let start_time = Instant::now();

    let metadata = fs::metadata(root_path).map_err(|e| map_file_error(root_path, e))?;
    if !metadata.is_dir() {
        return Err(MergeError::Scan {
            root: root_path.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }
    fs::read_dir(root_path).map_err(|e| map_file_error(root_path, e))?;

    let mut snapshot = TreeSnapshot::new(root_path.to_path_buf());
    let mut scanned_count: u64 = 0;

    let walker = ignore::WalkBuilder::new(root_path)
        .standard_filters(false)
        .follow_links(false)
        .build();

    for result in walker {
        let entry = result.map_err(|e| MergeError::Scan {
            root: root_path.to_path_buf(),
            message: e.to_string(),
        })?;

        if entry.depth() == 0 {
            continue;
        }

        let file_type = match entry.file_type() {
            Some(ft) => ft,
            None => continue,
        };

        if file_type.is_dir() {
            snapshot.total_dirs += 1;
            continue;
        }

        let relative = relative_key(root_path, entry.path())?;

        if !file_type.is_file() {
            warn!(
                "Skipping {} (not a regular file) in {}",
                relative,
                root_path.display()
            );
            snapshot.skipped.push(relative);
            continue;
        }

        let metadata = entry.metadata().map_err(|e| MergeError::Scan {
            root: root_path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mtime = metadata
            .modified()
            .map_err(|e| map_file_error(entry.path(), e))?;

        snapshot.insert(relative, mtime);

        scanned_count += 1;
        if let Some(callback) = on_progress {
            callback(scanned_count);
        }
    }

    snapshot.scan_duration = start_time.elapsed();
    debug!(
        "Scanned {}: {} files in {} directories ({:?})",
        root_path.display(),
        snapshot.len(),
        snapshot.total_dirs,
        snapshot.scan_duration
    );

    Ok(snapshot)
}

/// Snapshot the source and backup trees.
///
/// With `parallel` the source is scanned on a second thread; both scans finish
/// before this returns. The caller's tracing dispatcher is carried into that
/// thread so its log lines land in the same place.
pub fn snapshot_pair(
    source: &Path,
    backup: &Path,
    parallel: bool,
    on_progress: Option<&PairProgressCallback>,
) -> Result<(TreeSnapshot, TreeSnapshot), MergeError> {
    let source_progress = |files: u64| {
        if let Some(callback) = on_progress {
            callback("source", files);
        }
    };
    let backup_progress = |files: u64| {
        if let Some(callback) = on_progress {
            callback("backup", files);
        }
    };

    if !parallel {
        let source_snapshot = snapshot_tree(source, Some(&source_progress))?;
        let backup_snapshot = snapshot_tree(backup, Some(&backup_progress))?;
        return Ok((source_snapshot, backup_snapshot));
    }

    let dispatch = tracing::dispatcher::get_default(|current| current.clone());

    thread::scope(|scope| {
        let source_scan = scope.spawn(|| {
            tracing::dispatcher::with_default(&dispatch, || {
                snapshot_tree(source, Some(&source_progress))
            })
        });

        let backup_result = snapshot_tree(backup, Some(&backup_progress));
        let source_result = source_scan.join().map_err(|_| MergeError::Scan {
            root: source.to_path_buf(),
            message: "scanner thread panicked".to_string(),
        })?;

        Ok((source_result?, backup_result?))
    })
}

/// Convert `path` under `root` into a `/`-separated relative key.
pub fn relative_key(root: &Path, path: &Path) -> Result<String, MergeError> {
    let relative = path.strip_prefix(root).map_err(|_| MergeError::Scan {
        root: root.to_path_buf(),
        message: format!("{} is outside the scanned root", path.display()),
    })?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| MergeError::NonUtf8Path {
                    path: path.to_path_buf(),
                })?;
                parts.push(part);
            }
            _ => {
                return Err(MergeError::Scan {
                    root: root.to_path_buf(),
                    message: format!("unexpected path component in {}", path.display()),
                })
            }
        }
    }

    Ok(parts.join(&KEY_SEPARATOR.to_string()))
}
