//! Optional TOML settings file

use crate::types::{ErrorPolicy, TieBreak};
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults read from a settings file; every key is optional
///
/// ```toml
/// verbose = true
/// keep_source = false
/// on_error = "continue"
/// tie_break = "backup"
/// log_file = "/var/log/backup_merger.log"
/// parallel_scan = true
/// progress = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub verbose: Option<bool>,
    pub keep_source: Option<bool>,
    pub on_error: Option<ErrorPolicy>,
    pub tie_break: Option<TieBreak>,
    pub log_file: Option<PathBuf>,
    pub parallel_scan: Option<bool>,
    pub progress: Option<bool>,
}

/// Read and parse a settings file
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_full_file() {
        let settings: Settings = toml::from_str(
            r#"
            verbose = true
            keep_source = true
            on_error = "continue"
            tie_break = "report"
            log_file = "merge.log"
            parallel_scan = false
            progress = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.verbose, Some(true));
        assert_eq!(settings.on_error, Some(ErrorPolicy::Continue));
        assert_eq!(settings.tie_break, Some(TieBreak::Report));
        assert_eq!(settings.log_file, Some(PathBuf::from("merge.log")));
        assert_eq!(settings.parallel_scan, Some(false));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result: Result<Settings, _> = toml::from_str("delete_everything = true");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_settings_reports_path_on_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "tie_break = \"coin-flip\"").unwrap();

        let err = load_settings(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.toml"));
    }
}
