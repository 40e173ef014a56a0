//! Directory snapshot logic

mod walker;

pub use walker::{
    relative_key, snapshot_pair, snapshot_tree, PairProgressCallback, ProgressCallback,
};
