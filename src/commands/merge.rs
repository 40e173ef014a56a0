//! Main merge command
//!
//! A run has two phases. Phase 1 snapshots both trees and reconciles every
//! source path. Phase 2 removes the source tree, and only happens when phase 1
//! left nothing behind: no failures and no unresolved ties.

use crate::executor::Executor;
use crate::logging::build_dispatch;
use crate::reconcile::{reconcile, ReconcileEvent, ReconcileReport};
use crate::scanner::snapshot_pair;
use crate::types::{MergeError, Outcome};
use crate::ui::ProgressReporter;
use crate::Config;
use console::style;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

const BANNER: &str = "------------------------------------------------------------";

/// Everything a finished run reports
#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub source: PathBuf,
    pub backup: PathBuf,
    pub dry_run: bool,
    pub keep_source: bool,

    /// Number of files found in the source tree
    pub total_files: usize,

    pub report: ReconcileReport,

    /// Whether phase 2 deleted the source tree
    pub source_removed: bool,

    pub elapsed_ms: u64,
}

impl MergeSummary {
    /// Some paths failed to reconcile
    pub fn has_failures(&self) -> bool {
        !self.report.failures.is_empty()
    }

    /// Failures or unresolved ties are waiting for the user
    pub fn needs_attention(&self) -> bool {
        !self.report.is_clean()
    }
}

/// Run a merge with its own log dispatcher.
///
/// Every error is logged before it is returned.
pub fn run(config: &Config) -> Result<MergeSummary, MergeError> {
    let dispatch = match build_dispatch(config.verbose, config.log_file.as_deref()) {
        Ok(dispatch) => dispatch,
        Err(err) => {
            let fallback = build_dispatch(config.verbose, None)?;
            tracing::dispatcher::with_default(&fallback, || error!("{}", err));
            return Err(err);
        }
    };

    tracing::dispatcher::with_default(&dispatch, || {
        run_scoped(config).map_err(|err| {
            error!("{}", err);
            err
        })
    })
}

fn run_scoped(config: &Config) -> Result<MergeSummary, MergeError> {
    let started = Instant::now();
    config.validate()?;

    info!("{}", BANNER);
    info!(
        "Starting backup merge from {} to {}{}",
        config.source.display(),
        config.backup.display(),
        if config.dry_run { " (dry run)" } else { "" }
    );
    info!("{}", BANNER);

    let reporter = ProgressReporter::new(config.show_progress);
    reporter.start_scan();
    let scan_progress = |label: &'static str, files: u64| reporter.update_scan(label, files);
    let (source, backup) = snapshot_pair(
        &config.source,
        &config.backup,
        config.parallel_scan,
        Some(&scan_progress),
    )?;
    reporter.finish_scan(source.len(), backup.len());

    reporter.start_reconcile(source.len() as u64);
    let on_event = |event: &ReconcileEvent| reporter.handle_event(event);
    let result = reconcile(&source, &backup, config, Some(&on_event));
    reporter.clear();
    let report = result?;

    let counts = report.counts;
    info!("{}", BANNER);
    info!(
        "FINISHED comparing {} files from {} to {}",
        source.len(),
        config.source.display(),
        config.backup.display()
    );
    info!("New files moved: {}", counts.new_file_moved);
    info!("Identical files: {}", counts.identical_deleted);
    info!("Newer files: {}", counts.source_newer_archived);
    info!("Duplicate versions dropped: {}", counts.source_newer_deduplicated);
    info!("Older files archived: {}", counts.backup_newer_archived);
    if counts.tie_unresolved > 0 {
        warn!("Unresolved ties: {}", counts.tie_unresolved);
    }

    let source_removed = finish_source(config, &report)?;

    let elapsed = started.elapsed();
    info!("Time elapsed: {:.5}s", elapsed.as_secs_f64());
    info!("{}", BANNER);

    Ok(MergeSummary {
        source: config.source.clone(),
        backup: config.backup.clone(),
        dry_run: config.dry_run,
        keep_source: config.keep_source,
        total_files: source.len(),
        report,
        source_removed,
        elapsed_ms: elapsed.as_millis() as u64,
    })
}

/// Phase 2: delete the source tree when the run allows it
fn finish_source(config: &Config, report: &ReconcileReport) -> Result<bool, MergeError> {
    if config.keep_source {
        info!("Keeping {}", config.source.display());
        return Ok(false);
    }

    if !report.is_clean() {
        warn!(
            "Source folder {} retained: {} failed path(s), {} unresolved tie(s)",
            config.source.display(),
            report.failures.len(),
            report.counts.tie_unresolved
        );
        return Ok(false);
    }

    let executor = Executor::from_config(config);
    if executor.is_dry_run() {
        info!("Would delete {}", config.source.display());
        return Ok(false);
    }

    executor.remove_tree(&config.source)?;
    info!("Deleted {}", config.source.display());
    Ok(true)
}

/// Human-readable end-of-run summary
pub fn format_summary(summary: &MergeSummary) -> String {
    let counts = &summary.report.counts;
    let mut lines = Vec::new();

    let title = if summary.dry_run {
        "Dry run complete: no changes were made."
    } else {
        "Merge complete."
    };
    lines.push(style(title).bold().to_string());
    lines.push(format!(
        "  {} -> {}",
        summary.source.display(),
        summary.backup.display()
    ));
    lines.push(format!(
        "  Files: {}  Moved: {}  Identical: {}",
        summary.total_files, counts.new_file_moved, counts.identical_deleted
    ));
    lines.push(format!(
        "  Newer (archived backup): {}  Newer (duplicate dropped): {}  Older (archived source): {}",
        counts.source_newer_archived, counts.source_newer_deduplicated, counts.backup_newer_archived
    ));
    if counts.tie_unresolved > 0 {
        lines.push(
            style(format!("  Unresolved ties: {}", counts.tie_unresolved))
                .yellow()
                .to_string(),
        );
    }
    if summary.has_failures() {
        lines.push(
            style(format!("  Failed: {}", summary.report.failures.len()))
                .red()
                .to_string(),
        );
    }

    let source_line = if summary.source_removed {
        format!("  Deleted {}", summary.source.display())
    } else if summary.keep_source {
        format!("  Kept {}", summary.source.display())
    } else if summary.needs_attention() {
        style(format!(
            "  Kept {} (resolve the entries above and run again)",
            summary.source.display()
        ))
        .yellow()
        .to_string()
    } else {
        format!("  Would delete {}", summary.source.display())
    };
    lines.push(source_line);
    lines.push(format!("  Elapsed: {} ms", summary.elapsed_ms));

    lines.join("\n")
}

/// Per-path decision trace, as printed for dry runs
pub fn format_decision_trace(report: &ReconcileReport) -> String {
    if report.decisions.is_empty() && report.failures.is_empty() {
        return "Decisions:\n  (nothing to merge)".to_string();
    }

    let mut lines = Vec::with_capacity(report.decisions.len() + report.failures.len() + 1);
    lines.push("Decisions:".to_string());
    for decision in &report.decisions {
        let relation = match &decision.outcome {
            Outcome::SourceNewerArchived { .. } => "backup ->",
            Outcome::BackupNewerArchived { .. } => "source ->",
            _ => "same as",
        };
        let detail = decision
            .outcome
            .archive_path()
            .map(|path| format!(" ({} {})", relation, path.display()))
            .unwrap_or_default();
        lines.push(format!(
            "  {:<10} {}{}",
            decision.outcome.label(),
            decision.path,
            detail
        ));
    }
    for failure in &report.failures {
        lines.push(format!("  {:<10} {}: {}", "FAILED", failure.path, failure.message));
    }

    lines.join("\n")
}

/// Short hint for errors a user can act on
pub fn error_hint(error: &MergeError) -> Option<&'static str> {
    if error.is_permission_error() {
        Some("Check file permissions or run with a user that has access.")
    } else if error.is_disk_space_error() {
        Some("Free disk space on the backup drive and retry.")
    } else if matches!(error, MergeError::Validation(_)) {
        Some("Both paths must be existing, separate directories.")
    } else {
        None
    }
}
