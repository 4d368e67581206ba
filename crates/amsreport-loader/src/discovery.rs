//! Date folder discovery

use amsreport_core::{ConsolidateError, DateFolder, FolderDiscovery, ReportDate};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

fn date_folder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{1,2}-\d{1,2}-\d{4}$").expect("date folder pattern is valid"))
}

/// Scans a report root for `MM-DD-YYYY` folders
#[derive(Clone, Debug, Default)]
pub struct DateFolderScanner {
    /// Folder names never treated as dates (the output folder)
    ignored: Vec<String>,
}

impl DateFolderScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip a folder by name
    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored.push(name.into());
        self
    }
}

impl FolderDiscovery for DateFolderScanner {
    fn list_date_folders(&self, root: &Path) -> Result<Vec<DateFolder>, ConsolidateError> {
        let entries = std::fs::read_dir(root).map_err(|source| ConsolidateError::Discovery {
            path: root.to_path_buf(),
            source,
        })?;

        let mut folders = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if self.ignored.iter().any(|i| *i == name) {
                continue;
            }
            if !date_folder_pattern().is_match(&name) {
                debug!("skipping non-date folder {}", name);
                continue;
            }
            // The pattern admits impossible dates like 13-40-2025
            let Some(date) = ReportDate::parse(&name) else {
                debug!("skipping folder with invalid date {}", name);
                continue;
            };
            folders.push(DateFolder { date, path });
        }

        folders.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(folders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn pattern_matches_whole_name() {
        let p = date_folder_pattern();
        assert!(p.is_match("11-18-2025"));
        assert!(p.is_match("1-5-2025"));
        assert!(!p.is_match("11-18-2025-old"));
        assert!(!p.is_match("2025-11-18"));
        assert!(!p.is_match("Consolidated_Reports"));
    }

    #[test]
    fn lists_valid_folders_ascending() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["11-20-2025", "11-18-2025", "2-1-2025", "13-40-2025", "notes", "Consolidated_Reports"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("11-19-2025"), b"a file, not a folder").unwrap();

        let scanner = DateFolderScanner::new().ignore("Consolidated_Reports");
        let folders = scanner.list_date_folders(dir.path()).unwrap();
        let labels: Vec<_> = folders.iter().map(|f| f.date.label.as_str()).collect();
        assert_eq!(labels, vec!["2-1-2025", "11-18-2025", "11-20-2025"]);
        assert_eq!(folders[1].path, dir.path().join("11-18-2025"));
    }

    #[test]
    fn missing_root_is_a_discovery_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DateFolderScanner::new()
            .list_date_folders(&dir.path().join("absent"))
            .unwrap_err();
        assert!(matches!(err, ConsolidateError::Discovery { .. }));
    }
}
