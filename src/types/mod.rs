//! Core type definitions for backup-merger

mod error;
mod outcome;
mod policy;
mod snapshot;

pub use error::{map_file_error, MergeError};
pub use outcome::{Outcome, OutcomeCounts};
pub use policy::{ErrorPolicy, TieBreak};
pub use snapshot::{join_key, TreeSnapshot, KEY_SEPARATOR};
