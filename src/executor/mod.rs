//! Executor module for file operations
//!
//! Every filesystem mutation of a merge goes through [`Executor`]. In dry-run
//! mode each call is logged at debug level and returns without touching the
//! disk.

pub mod archive;
pub mod copy;

pub use copy::copy_file_atomic;

use crate::types::{map_file_error, MergeError};
use crate::Config;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// How files leave the source tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Rename (copy + delete across devices); source copies are deleted
    Move,

    /// Atomic copy; the source tree is never modified
    Copy,
}

/// Filesystem actions for one merge run
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    dry_run: bool,
    mode: TransferMode,
}

impl Executor {
    pub fn new(dry_run: bool, mode: TransferMode) -> Self {
        Self { dry_run, mode }
    }

    /// Executor matching `config.dry_run` and `config.keep_source`
    pub fn from_config(config: &Config) -> Self {
        let mode = if config.keep_source {
            TransferMode::Copy
        } else {
            TransferMode::Move
        };
        Self::new(config.dry_run, mode)
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Create `dir` and any missing parents
    pub fn ensure_dir(&self, dir: &Path) -> Result<(), MergeError> {
        if self.dry_run {
            debug!("[dry-run] mkdir -p {}", dir.display());
            return Ok(());
        }
        fs::create_dir_all(dir).map_err(|e| map_file_error(dir, e))
    }

    /// Bring a source file to `to`, moving or copying per [`TransferMode`]
    pub fn transfer(&self, from: &Path, to: &Path) -> Result<(), MergeError> {
        match self.mode {
            TransferMode::Move => self.move_file(from, to),
            TransferMode::Copy => {
                if self.dry_run {
                    debug!("[dry-run] copy {} -> {}", from.display(), to.display());
                    return Ok(());
                }
                copy_file_atomic(from, to).map(|_| ())
            }
        }
    }

    /// Rename `from` to `to`, falling back to copy + delete across devices
    pub fn move_file(&self, from: &Path, to: &Path) -> Result<(), MergeError> {
        if self.dry_run {
            debug!("[dry-run] move {} -> {}", from.display(), to.display());
            return Ok(());
        }

        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::CrossesDevices => {
                copy_file_atomic(from, to)?;
                fs::remove_file(from).map_err(|e| map_file_error(from, e))
            }
            Err(e) => Err(map_file_error(from, e)),
        }
    }

    /// Drop a redundant source file; a no-op when copying
    pub fn discard_source(&self, path: &Path) -> Result<(), MergeError> {
        if self.mode == TransferMode::Copy {
            return Ok(());
        }
        if self.dry_run {
            debug!("[dry-run] rm {}", path.display());
            return Ok(());
        }
        fs::remove_file(path).map_err(|e| map_file_error(path, e))
    }

    /// Remove a whole directory tree
    pub fn remove_tree(&self, root: &Path) -> Result<(), MergeError> {
        if self.dry_run {
            debug!("[dry-run] rm -r {}", root.display());
            return Ok(());
        }
        fs::remove_dir_all(root).map_err(|e| map_file_error(root, e))
    }
}
