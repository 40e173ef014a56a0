//! Reconcile report: counts, decision trace and failures

use crate::types::{MergeError, Outcome, OutcomeCounts};
use serde::{Deserialize, Serialize};

/// Decision taken for one relative path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathDecision {
    pub path: String,
    pub outcome: Outcome,
}

/// A path that could not be reconciled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathFailure {
    pub path: String,
    pub message: String,
}

/// Result of one reconcile pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Per-kind totals
    pub counts: OutcomeCounts,

    /// Every decision, in processing order
    pub decisions: Vec<PathDecision>,

    /// Paths that failed (only populated with the `continue` policy)
    pub failures: Vec<PathFailure>,
}

impl ReconcileReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for `path` and update counts
    pub fn record(&mut self, path: &str, outcome: Outcome) {
        self.counts.record(&outcome);
        self.decisions.push(PathDecision {
            path: path.to_string(),
            outcome,
        });
    }

    /// Record a failed path
    pub fn record_failure(&mut self, path: &str, error: &MergeError) {
        self.failures.push(PathFailure {
            path: path.to_string(),
            message: error.to_string(),
        });
    }

    /// Outcome recorded for `path`
    pub fn outcome_for(&self, path: &str) -> Option<&Outcome> {
        self.decisions
            .iter()
            .find(|decision| decision.path == path)
            .map(|decision| &decision.outcome)
    }

    /// True when every path resolved and nothing is waiting for review.
    ///
    /// Only a clean report allows the source tree to be removed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.counts.tie_unresolved == 0
    }
}
