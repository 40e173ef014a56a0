//! Reconciler - merges a source snapshot into a backup tree
//!
//! Each source path is resolved on its own, in path order:
//!
//! | backup has path | content   | mtimes            | action                                   |
//! |-----------------|-----------|-------------------|------------------------------------------|
//! | no              | -         | -                 | move into backup                         |
//! | yes             | identical | -                 | drop source copy                         |
//! | yes             | differs   | source newer      | archive backup file, move source in      |
//! | yes             | differs   | backup newer      | archive source copy                      |
//! | yes             | differs   | equal             | per [`TieBreak`]                         |
//!
//! When the source is newer but the backup file already has a byte-identical
//! version in its `.oldversion` folder, nothing is archived and the source
//! candidate is dropped.

mod compare;
mod decide;
mod report;

pub use compare::files_identical;
pub use decide::{resolve_conflict, Resolution};
pub use report::{PathDecision, PathFailure, ReconcileReport};

use crate::executor::archive::{archive_dir_for, archive_target, find_identical_version};
use crate::executor::Executor;
use crate::types::{
    map_file_error, ErrorPolicy, MergeError, Outcome, OutcomeCounts, TieBreak, TreeSnapshot,
};
use crate::Config;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::Path;
use std::time::SystemTime;
use tracing::{error, info, warn};

/// Events emitted while reconciling.
#[derive(Debug)]
pub enum ReconcileEvent {
    /// A path is about to be processed.
    PathStart {
        index: usize,
        total: usize,
        path: String,
    },
    /// A path was resolved.
    PathResolved {
        index: usize,
        total: usize,
        path: String,
        outcome: Outcome,
    },
    /// A path failed.
    PathFailed {
        index: usize,
        total: usize,
        path: String,
        error: String,
    },
    /// Every path was processed.
    Complete { counts: OutcomeCounts },
}

/// Optional callback used to receive reconcile events.
pub type ReconcileCallback<'a> = dyn Fn(&ReconcileEvent) + Send + Sync + 'a;

/// Merge every path of `source` into the tree of `backup`.
///
/// The roots are the snapshots' roots. `config` supplies dry-run, keep-source,
/// tie-break and failure policies. Under dry-run the decisions and log lines
/// are the same as a live run, but no filesystem call mutates anything.
///
/// With [`ErrorPolicy::Abort`] the first failing path is returned as
/// [`MergeError::PathFailed`]; with [`ErrorPolicy::Continue`] it is logged,
/// recorded in the report and the pass goes on.
///
/// This never removes the source tree; that is the caller's second phase.
pub fn reconcile(
    source: &TreeSnapshot,
    backup: &TreeSnapshot,
    config: &Config,
    on_event: Option<&ReconcileCallback>,
) -> Result<ReconcileReport, MergeError> {
    let executor = Executor::from_config(config);
    let mut report = ReconcileReport::new();
    let total = source.len();

    for (idx, (path, source_mtime)) in source.iter().enumerate() {
        let index = idx + 1;
        emit_event(
            on_event,
            ReconcileEvent::PathStart {
                index,
                total,
                path: path.to_string(),
            },
        );

        match reconcile_path(path, source_mtime, source, backup, config.tie_break, &executor) {
            Ok(outcome) => {
                emit_event(
                    on_event,
                    ReconcileEvent::PathResolved {
                        index,
                        total,
                        path: path.to_string(),
                        outcome: outcome.clone(),
                    },
                );
                report.record(path, outcome);
            }
            Err(err) => {
                emit_event(
                    on_event,
                    ReconcileEvent::PathFailed {
                        index,
                        total,
                        path: path.to_string(),
                        error: err.to_string(),
                    },
                );
                match config.on_error {
                    ErrorPolicy::Abort => return Err(err.at_path(path)),
                    ErrorPolicy::Continue => {
                        error!("Failed to reconcile {}: {}", path, err);
                        report.record_failure(path, &err);
                    }
                }
            }
        }
    }

    emit_event(
        on_event,
        ReconcileEvent::Complete {
            counts: report.counts,
        },
    );

    Ok(report)
}

fn reconcile_path(
    path: &str,
    source_mtime: SystemTime,
    source: &TreeSnapshot,
    backup: &TreeSnapshot,
    tie_break: TieBreak,
    executor: &Executor,
) -> Result<Outcome, MergeError> {
    let source_file = source.native_path(path);
    let backup_file = backup.native_path(path);

    // Earlier paths of this run may have created the target since the snapshot.
    let backup_mtime = match backup.get(path) {
        Some(mtime) => mtime,
        None => match current_mtime(&backup_file)? {
            Some(mtime) => {
                warn!("{} appeared in backup location during the merge", path);
                mtime
            }
            None => {
                info!(
                    "Moving {} to {}",
                    source_file.display(),
                    backup_file.display()
                );
                if let Some(parent) = backup_file.parent() {
                    executor.ensure_dir(parent)?;
                }
                executor.transfer(&source_file, &backup_file)?;
                return Ok(Outcome::NewFileMoved);
            }
        },
    };

    info!("Found file {} in backup location", path);

    if files_identical(&source_file, &backup_file)? {
        info!(" SAME, deleting {}", source_file.display());
        executor.discard_source(&source_file)?;
        return Ok(Outcome::IdenticalDeleted);
    }

    let archive_dir = archive_dir_for(&backup_file);
    let file_name = file_name_of(path);

    match resolve_conflict(source_mtime, backup_mtime, tie_break) {
        Resolution::SourceWins => {
            if let Some(existing) = find_identical_version(&backup_file, &archive_dir)? {
                info!(
                    " NOT UNIQUE: {} is identical to {}",
                    backup_file.display(),
                    existing.display()
                );
                info!("  Deleting {}", source_file.display());
                executor.discard_source(&source_file)?;
                return Ok(Outcome::SourceNewerDeduplicated {
                    duplicate_of: existing,
                });
            }

            executor.ensure_dir(&archive_dir)?;
            let target = archive_target(&archive_dir, file_name, backup_mtime);
            info!(
                " NEWER: {} is newer than {}",
                source_file.display(),
                backup_file.display()
            );
            info!("  Moving {} to {}", backup_file.display(), target.display());
            info!("  Moving {} to {}", source_file.display(), backup_file.display());

            // Archive first: a failure afterwards leaves both versions on disk.
            executor.move_file(&backup_file, &target)?;
            executor.transfer(&source_file, &backup_file)?;
            Ok(Outcome::SourceNewerArchived {
                archived_as: target,
            })
        }
        Resolution::BackupWins => {
            executor.ensure_dir(&archive_dir)?;
            let target = archive_target(&archive_dir, file_name, source_mtime);
            info!(
                " OLDER: {} is not newer than {}",
                source_file.display(),
                backup_file.display()
            );
            info!("  Moving {} to {}", source_file.display(), target.display());
            executor.transfer(&source_file, &target)?;
            Ok(Outcome::BackupNewerArchived {
                archived_as: target,
            })
        }
        Resolution::Unresolved => {
            warn!(
                " TIE: {} and {} have the same modification time but different content; left for review",
                source_file.display(),
                backup_file.display()
            );
            Ok(Outcome::TieUnresolved)
        }
    }
}

/// Modification time of a regular file at `path`, `None` when nothing is there.
///
/// Anything other than a regular file is an error: it must not be replaced.
fn current_mtime(path: &Path) -> Result<Option<SystemTime>, MergeError> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(map_file_error(path, e)),
    };
    if !metadata.is_file() {
        return Err(MergeError::FileSystem {
            path: path.to_path_buf(),
            source: io::Error::new(ErrorKind::AlreadyExists, "occupied by a non-regular file"),
        });
    }
    metadata
        .modified()
        .map(Some)
        .map_err(|e| map_file_error(path, e))
}

fn file_name_of(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

fn emit_event(on_event: Option<&ReconcileCallback>, event: ReconcileEvent) {
    if let Some(callback) = on_event {
        callback(&event);
    }
}
