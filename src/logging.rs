//! Per-run log dispatch
//!
//! Nothing is installed globally. [`build_dispatch`] returns a [`Dispatch`]
//! that a merge run enters with [`tracing::dispatcher::with_default`], so two
//! runs in one process never share sinks or levels.

use crate::types::MergeError;
use std::path::Path;
use tracing::Dispatch;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable overriding the level filter
pub const LOG_ENV_VAR: &str = "BACKUP_MERGER_LOG";

/// Default filter directive for a run
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Build the dispatcher for one run.
///
/// Events go to stderr and, when `log_file` is set, are appended to that file
/// without colour codes.
pub fn build_dispatch(verbose: bool, log_file: Option<&Path>) -> Result<Dispatch, MergeError> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(console::colors_enabled_stderr());

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(open_log_file(path)?)
                .with_target(false)
                .with_ansi(false),
        ),
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);

    Ok(Dispatch::new(subscriber))
}

fn open_log_file(path: &Path) -> Result<RollingFileAppender, MergeError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| MergeError::Config(format!("Invalid log file path: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(|e| {
            MergeError::Config(format!("Cannot open log file {}: {}", path.display(), e))
        })
}
