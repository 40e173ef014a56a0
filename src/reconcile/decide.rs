//! Timestamp-based conflict resolution

use crate::types::TieBreak;
use std::cmp::Ordering;
use std::time::SystemTime;

/// Which side keeps the path when content differs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Source replaces the backup file; backup file is archived
    SourceWins,

    /// Backup file stays; source copy is archived
    BackupWins,

    /// Left alone for manual review
    Unresolved,
}

/// Resolve a content conflict from the two modification times.
///
/// A strictly newer source wins, a strictly newer backup wins, and equal
/// timestamps fall back to `tie_break`.
pub fn resolve_conflict(
    source_mtime: SystemTime,
    backup_mtime: SystemTime,
    tie_break: TieBreak,
) -> Resolution {
    match source_mtime.cmp(&backup_mtime) {
        Ordering::Greater => Resolution::SourceWins,
        Ordering::Less => Resolution::BackupWins,
        Ordering::Equal => match tie_break {
            TieBreak::Source => Resolution::SourceWins,
            TieBreak::Backup => Resolution::BackupWins,
            TieBreak::Report => Resolution::Unresolved,
        },
    }
}
