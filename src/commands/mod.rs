//! Command implementations

pub mod merge;

pub use merge::{run, MergeSummary};
