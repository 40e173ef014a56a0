//! Progress reporting

use crate::reconcile::ReconcileEvent;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Progress reporter for merge runs
///
/// All methods take `&self` so the reporter can be shared with scan threads
/// and event callbacks.
pub struct ProgressReporter {
    scan_bar: ProgressBar,
    reconcile_bar: ProgressBar,
    source_files: AtomicU64,
    backup_files: AtomicU64,
}

impl ProgressReporter {
    /// Create a reporter; bars are hidden unless `enabled` and stderr is a terminal
    pub fn new(enabled: bool) -> Self {
        let visible = enabled && console::Term::stderr().is_term();

        let scan_bar = if visible {
            let bar = ProgressBar::new_spinner();
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            scan_bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }

        let reconcile_bar = if visible {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) =
            ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} files | {msg}")
        {
            reconcile_bar.set_style(style.progress_chars("=>-"));
        }

        Self {
            scan_bar,
            reconcile_bar,
            source_files: AtomicU64::new(0),
            backup_files: AtomicU64::new(0),
        }
    }

    /// Mark start of the scanning phase.
    pub fn start_scan(&self) {
        self.source_files.store(0, Ordering::Relaxed);
        self.backup_files.store(0, Ordering::Relaxed);
        self.scan_bar.set_message("Scanning source and backup...");
    }

    /// Update the file counter of one tree.
    pub fn update_scan(&self, label: &str, files: u64) {
        match label {
            "source" => self.source_files.store(files, Ordering::Relaxed),
            _ => self.backup_files.store(files, Ordering::Relaxed),
        }
        self.scan_bar.set_message(self.scan_message("Scanning"));
    }

    /// Mark completion of the scanning phase.
    pub fn finish_scan(&self, source_files: usize, backup_files: usize) {
        self.source_files.store(source_files as u64, Ordering::Relaxed);
        self.backup_files.store(backup_files as u64, Ordering::Relaxed);
        self.scan_bar.finish_with_message(self.scan_message("Scanned"));
    }

    /// Initialize the reconcile bar.
    pub fn start_reconcile(&self, total_files: u64) {
        self.reconcile_bar.set_length(total_files);
        self.reconcile_bar.set_position(0);
        self.reconcile_bar.set_message("Comparing...".to_string());
    }

    /// Advance the reconcile bar from an event.
    pub fn handle_event(&self, event: &ReconcileEvent) {
        match event {
            ReconcileEvent::PathStart { path, .. } => {
                self.reconcile_bar.set_message(path.clone());
            }
            ReconcileEvent::PathResolved { .. } => self.reconcile_bar.inc(1),
            ReconcileEvent::PathFailed { path, error, .. } => {
                self.reconcile_bar.inc(1);
                self.reconcile_bar
                    .println(format!("ERROR {}: {}", path, error));
            }
            ReconcileEvent::Complete { counts } => {
                self.reconcile_bar.finish_with_message(format!(
                    "{} moved, {} identical, {} conflicts",
                    counts.new_file_moved,
                    counts.identical_deleted,
                    counts.conflicts()
                ));
            }
        }
    }

    /// Remove both bars from the terminal.
    pub fn clear(&self) {
        self.scan_bar.finish_and_clear();
        self.reconcile_bar.finish_and_clear();
    }

    fn scan_message(&self, verb: &str) -> String {
        format!(
            "{} source: {} files | backup: {} files",
            verb,
            self.source_files.load(Ordering::Relaxed),
            self.backup_files.load(Ordering::Relaxed)
        )
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true)
    }
}
