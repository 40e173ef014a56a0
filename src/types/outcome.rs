//! Outcome - what the reconciler did with one relative path

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Resolution applied to a single source path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// Path only existed in the source; relocated into the backup
    NewFileMoved,

    /// Backup already held identical bytes; source copy removed
    IdenticalDeleted,

    /// Source was newer; old backup file archived, source took its place
    SourceNewerArchived { archived_as: PathBuf },

    /// Source was newer but the backup file already had an identical archived
    /// version; source candidate removed, backup untouched
    SourceNewerDeduplicated { duplicate_of: PathBuf },

    /// Backup was newer; stale source copy archived next to it
    BackupNewerArchived { archived_as: PathBuf },

    /// Equal mtimes with different content, left for manual review
    TieUnresolved,
}

impl Outcome {
    /// Short label used in logs and the dry-run trace
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::NewFileMoved => "MOVE",
            Outcome::IdenticalDeleted => "SAME",
            Outcome::SourceNewerArchived { .. } => "NEWER",
            Outcome::SourceNewerDeduplicated { .. } => "NOT UNIQUE",
            Outcome::BackupNewerArchived { .. } => "OLDER",
            Outcome::TieUnresolved => "TIE",
        }
    }

    /// Archive entry created (or matched) by this outcome, if any
    pub fn archive_path(&self) -> Option<&PathBuf> {
        match self {
            Outcome::SourceNewerArchived { archived_as }
            | Outcome::BackupNewerArchived { archived_as } => Some(archived_as),
            Outcome::SourceNewerDeduplicated { duplicate_of } => Some(duplicate_of),
            _ => None,
        }
    }
}

/// Per-kind outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub new_file_moved: usize,
    pub identical_deleted: usize,
    pub source_newer_archived: usize,
    pub source_newer_deduplicated: usize,
    pub backup_newer_archived: usize,
    pub tie_unresolved: usize,
}

impl OutcomeCounts {
    /// Count one outcome
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::NewFileMoved => self.new_file_moved += 1,
            Outcome::IdenticalDeleted => self.identical_deleted += 1,
            Outcome::SourceNewerArchived { .. } => self.source_newer_archived += 1,
            Outcome::SourceNewerDeduplicated { .. } => self.source_newer_deduplicated += 1,
            Outcome::BackupNewerArchived { .. } => self.backup_newer_archived += 1,
            Outcome::TieUnresolved => self.tie_unresolved += 1,
        }
    }

    /// Total number of resolved paths
    pub fn total(&self) -> usize {
        self.new_file_moved + self.identical_deleted + self.conflicts()
    }

    /// Paths present in both trees with different content
    pub fn conflicts(&self) -> usize {
        self.source_newer_archived
            + self.source_newer_deduplicated
            + self.backup_newer_archived
            + self.tie_unresolved
    }
}
