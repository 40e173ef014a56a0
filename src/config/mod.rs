//! Configuration management

mod settings;

pub use settings::{load_settings, Settings};

use crate::types::{ErrorPolicy, MergeError, TieBreak};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "backup-merger",
    version,
    about = "Merge a folder into its backup, archiving superseded versions in .oldversion folders",
    long_about = "Merge SOURCE into BACKUP. Files missing from BACKUP are moved in, identical \
                  files are dropped from SOURCE, and for conflicting files the newer one wins \
                  while the older one is kept under a .oldversion folder next to it.\n\n\
                  WARNING: after a successful run (without --dry-run or --keep-source) the \
                  whole SOURCE directory is deleted."
)]
pub struct Cli {
    /// Folder to merge into the backup (removed after a successful run)
    pub source: PathBuf,

    /// Backup location receiving the files
    pub backup: PathBuf,

    /// Log every decision to the console
    #[arg(short, long)]
    pub verbose: bool,

    /// Show what would happen without touching either tree
    #[arg(short, long, alias = "dry_run")]
    pub dry_run: bool,

    /// Copy instead of move and never delete anything from SOURCE
    #[arg(long)]
    pub keep_source: bool,

    /// Behaviour when a single file fails
    #[arg(long, value_enum)]
    pub on_error: Option<ErrorPolicy>,

    /// Resolution for files with equal timestamps but different content
    #[arg(long, value_enum)]
    pub tie_break: Option<TieBreak>,

    /// Also write the log to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// TOML file with default settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Scan the two trees one after the other instead of in parallel
    #[arg(long)]
    pub sequential_scan: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Global configuration for a merge run
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder being merged (the "source" tree)
    pub source: PathBuf,

    /// Backup location (the "destination" tree)
    pub backup: PathBuf,

    /// Info-level logging on the console
    pub verbose: bool,

    /// Dry run (log decisions, mutate nothing)
    pub dry_run: bool,

    /// Copy instead of move; source tree is never modified
    pub keep_source: bool,

    /// Abort or continue after a failed path
    pub on_error: ErrorPolicy,

    /// Equal-mtime conflict resolution
    pub tie_break: TieBreak,

    /// Optional persisted log
    pub log_file: Option<PathBuf>,

    /// Snapshot both trees concurrently
    pub parallel_scan: bool,

    /// Draw progress bars on stderr
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            backup: PathBuf::new(),
            verbose: false,
            dry_run: false,
            keep_source: false,
            on_error: ErrorPolicy::Abort,
            tie_break: TieBreak::Backup,
            log_file: None,
            parallel_scan: true,
            show_progress: false,
        }
    }
}

impl Config {
    /// Config for merging `source` into `backup` with default policies
    pub fn new(source: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            backup: backup.into(),
            ..Self::default()
        }
    }

    /// Apply file settings on top of the defaults
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        if let Some(verbose) = settings.verbose {
            self.verbose = verbose;
        }
        if let Some(keep_source) = settings.keep_source {
            self.keep_source = keep_source;
        }
        if let Some(on_error) = settings.on_error {
            self.on_error = on_error;
        }
        if let Some(tie_break) = settings.tie_break {
            self.tie_break = tie_break;
        }
        if let Some(log_file) = &settings.log_file {
            self.log_file = Some(log_file.clone());
        }
        if let Some(parallel_scan) = settings.parallel_scan {
            self.parallel_scan = parallel_scan;
        }
        if let Some(progress) = settings.progress {
            self.show_progress = progress;
        }
        self
    }

    /// Validate the two roots before anything is scanned
    ///
    /// Both must be existing directories, and neither may contain the other:
    /// the final source removal would otherwise take the backup with it.
    pub fn validate(&self) -> Result<(), MergeError> {
        let source = canonical_dir(&self.source, "Source")?;
        let backup = canonical_dir(&self.backup, "Backup")?;

        if source == backup {
            return Err(MergeError::Validation(format!(
                "Source and backup are the same directory: {}",
                source.display()
            )));
        }
        if backup.starts_with(&source) {
            return Err(MergeError::Validation(format!(
                "Backup {} is inside source {}",
                backup.display(),
                source.display()
            )));
        }
        if source.starts_with(&backup) {
            return Err(MergeError::Validation(format!(
                "Source {} is inside backup {}",
                source.display(),
                backup.display()
            )));
        }

        Ok(())
    }
}

fn canonical_dir(path: &Path, label: &str) -> Result<PathBuf, MergeError> {
    let metadata = fs::metadata(path).map_err(|e| {
        MergeError::Validation(format!(
            "{} path does not exist or is not accessible: {} ({})",
            label,
            path.display(),
            e
        ))
    })?;
    if !metadata.is_dir() {
        return Err(MergeError::Validation(format!(
            "{} path is not a directory: {}",
            label,
            path.display()
        )));
    }
    fs::canonicalize(path).map_err(|e| {
        MergeError::Validation(format!(
            "{} path cannot be resolved: {} ({})",
            label,
            path.display(),
            e
        ))
    })
}

impl TryFrom<Cli> for Config {
    type Error = anyhow::Error;

    /// CLI flags override the settings file, which overrides the defaults.
    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let settings = match &cli.config {
            Some(path) => load_settings(path)?,
            None => Settings::default(),
        };

        let mut config = Config::new(cli.source, cli.backup).with_settings(&settings);
        config.show_progress = settings.progress.unwrap_or(true);

        config.verbose |= cli.verbose;
        config.dry_run = cli.dry_run;
        config.keep_source |= cli.keep_source;
        if let Some(on_error) = cli.on_error {
            config.on_error = on_error;
        }
        if let Some(tie_break) = cli.tie_break {
            config.tie_break = tie_break;
        }
        if cli.log_file.is_some() {
            config.log_file = cli.log_file;
        }
        if cli.sequential_scan {
            config.parallel_scan = false;
        }
        if cli.no_progress || cli.json || config.verbose {
            config.show_progress = false;
        }

        Ok(config)
    }
}
