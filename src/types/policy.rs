//! Run policies selected through config or CLI

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// What to do when source and backup have equal mtimes but different bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Keep the backup file, archive the source copy
    #[default]
    Backup,

    /// Archive the backup file, source copy replaces it
    Source,

    /// Touch neither file and keep the source tree for manual review
    Report,
}

/// How a failure on one path affects the rest of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first failing path
    #[default]
    Abort,

    /// Log the failure and carry on with the remaining paths
    Continue,
}
