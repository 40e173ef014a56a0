//! # backup-merger - fold a folder back into its backup
//!
//! Moves every file of a source folder into a backup tree. Files the backup
//! lacks are moved in, identical files are dropped, and when both sides hold
//! different content the newer one takes the path while the older one is kept
//! in a `.oldversion` folder next to it. Once every path is settled the source
//! folder is deleted.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let summary = backup_merger::merge_backup(
//!     Path::new("/media/usb/photos"),
//!     Path::new("/backup/photos"),
//!     true,
//!     true,
//! )?;
//! println!("{} files compared", summary.total_files);
//! # Ok::<(), backup_merger::MergeError>(())
//! ```

// Module declarations
pub mod commands;
pub mod config;
pub mod executor;
pub mod logging;
pub mod reconcile;
pub mod scanner;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use commands::MergeSummary;
pub use config::Config;
pub use reconcile::{reconcile, ReconcileReport};
pub use scanner::snapshot_tree;
pub use types::{ErrorPolicy, MergeError, Outcome, OutcomeCounts, TieBreak, TreeSnapshot};

use std::path::Path;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Merge `source` into `backup` with the default policies.
///
/// `verbose` logs every decision at info level; `dry_run` computes and logs
/// everything without touching either tree. On success the source folder is
/// gone unless this was a dry run or some path needs attention.
pub fn merge_backup(
    source: &Path,
    backup: &Path,
    verbose: bool,
    dry_run: bool,
) -> Result<MergeSummary, MergeError> {
    let config = Config {
        verbose,
        dry_run,
        ..Config::new(source, backup)
    };
    commands::run(&config)
}
