//! Error types for backup-merger

use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for merge operations
#[derive(Debug, Error)]
pub enum MergeError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (bad source/backup roots)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Permission denied for specific path
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Disk full while writing a path
    #[error("Disk full while writing {path}")]
    DiskFull { path: PathBuf },

    /// Any other filesystem failure, with the path that caused it
    #[error("Filesystem error at {path}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed below a snapshot root
    #[error("Failed to scan {root}: {message}")]
    Scan { root: PathBuf, message: String },

    /// File name that cannot be used as a relative path key
    #[error("Path is not valid UTF-8: {path}")]
    NonUtf8Path { path: PathBuf },

    /// A single relative path failed to reconcile
    #[error("Failed to reconcile '{path}': {source}")]
    PathFailed {
        path: String,
        #[source]
        source: Box<MergeError>,
    },
}

impl MergeError {
    /// Check if this error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(self, MergeError::Validation(_) | MergeError::Config(_))
    }

    /// Check if this error is related to permissions
    pub fn is_permission_error(&self) -> bool {
        match self {
            MergeError::PermissionDenied { .. } => true,
            MergeError::PathFailed { source, .. } => source.is_permission_error(),
            _ => false,
        }
    }

    /// Check if this error is related to disk space
    pub fn is_disk_space_error(&self) -> bool {
        match self {
            MergeError::DiskFull { .. } => true,
            MergeError::PathFailed { source, .. } => source.is_disk_space_error(),
            _ => false,
        }
    }

    /// Wrap an error with the relative path being reconciled.
    pub fn at_path(self, path: &str) -> Self {
        MergeError::PathFailed {
            path: path.to_string(),
            source: Box::new(self),
        }
    }
}

/// Classify a raw IO error raised while touching `path`.
pub fn map_file_error(path: &Path, error: Error) -> MergeError {
    if matches!(error.kind(), ErrorKind::PermissionDenied) {
        MergeError::PermissionDenied {
            path: path.to_path_buf(),
        }
    } else if matches!(error.kind(), ErrorKind::StorageFull)
        || matches!(error.raw_os_error(), Some(28 | 122))
    {
        MergeError::DiskFull {
            path: path.to_path_buf(),
        }
    } else {
        MergeError::FileSystem {
            path: path.to_path_buf(),
            source: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_validation_error() {
        let error = MergeError::Validation("Source path does not exist: /nope".to_string());
        assert!(error.to_string().contains("Validation error"));
        assert!(error.to_string().contains("/nope"));
        assert!(error.is_validation_error());
    }

    #[test]
    fn test_config_error_counts_as_validation() {
        let error = MergeError::Config("bad tie-break".to_string());
        assert!(error.is_validation_error());
        assert!(!error.is_permission_error());
    }

    #[test]
    fn test_map_permission_denied() {
        let error = map_file_error(
            Path::new("/protected/file.txt"),
            IoError::new(ErrorKind::PermissionDenied, "denied"),
        );
        assert!(error.is_permission_error());
        assert!(error.to_string().contains("/protected/file.txt"));
    }

    #[test]
    fn test_map_disk_full_by_os_code() {
        let error = map_file_error(Path::new("big.bin"), IoError::from_raw_os_error(28));
        assert!(error.is_disk_space_error());
        assert!(error.to_string().contains("big.bin"));
    }

    #[test]
    fn test_map_other_error_keeps_path_and_source() {
        let error = map_file_error(
            Path::new("gone.txt"),
            IoError::new(ErrorKind::NotFound, "vanished"),
        );
        match &error {
            MergeError::FileSystem { path, source } => {
                assert_eq!(path, &PathBuf::from("gone.txt"));
                assert_eq!(source.kind(), ErrorKind::NotFound);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
        assert!(error.to_string().contains("vanished"));
    }

    #[test]
    fn test_path_failed_wraps_relative_path() {
        let inner = MergeError::PermissionDenied {
            path: PathBuf::from("/backup/a.txt"),
        };
        let error = inner.at_path("docs/a.txt");

        assert!(error.to_string().contains("docs/a.txt"));
        assert!(error.is_permission_error());
        assert!(!error.is_validation_error());
    }

    #[test]
    fn test_result_propagation() {
        fn inner_function() -> Result<(), MergeError> {
            Err(MergeError::Validation("test error".to_string()))
        }

        fn outer_function() -> Result<(), MergeError> {
            inner_function()?;
            Ok(())
        }

        let result = outer_function();
        assert!(matches!(result.unwrap_err(), MergeError::Validation(_)));
    }
}
