//! # amsreport-core
//!
//! Core data model and collaborator traits for the amsreport consolidator.
//!
//! This crate provides:
//! - Domain types: `TableSource`, `WideTable`, `ConsolidatedTable`, `HighlightSet`
//! - Collaborator traits: `FolderDiscovery`, `ReportLoader`, `WorkbookWriter`
//! - Error types and the `Settings` configuration
//!
//! ## Example
//!
//! ```rust
//! use amsreport_core::{CellValue, Environment, Table};
//!
//! let table = Table::from_rows(
//!     &["InstanceId", "Max CPUUtilization (%)"],
//!     vec![vec!["i-1".into(), 9.into()]],
//! );
//! assert_eq!(table.cell(0, "InstanceId"), Some(&CellValue::from("i-1")));
//! assert_eq!(Environment::from_name("shared_services"), Some(Environment::SharedServices));
//! ```

pub mod config;
pub mod table;

pub use config::{ConfigError, HighlightMode, Settings};
pub use table::{CellValue, Table};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Well-known column names
// ============================================================================

/// Provenance column holding the folder date (`MM-DD-YYYY`)
pub const DATE_REPORT_COLUMN: &str = "Date_Report";

/// Provenance column holding the environment folder name
pub const ENVIRONMENT_COLUMN: &str = "Environment";

/// Bookkeeping columns that must never reach an output sheet
pub const BOOKKEEPING_COLUMNS: [&str; 2] = ["Source_File", "Date_Folder"];

/// Name of the consolidated sheet
pub const ALL_DATA_SHEET: &str = "All_Data";

// ============================================================================
// Dates and environments
// ============================================================================

/// Date of a report folder, keeping the folder's own spelling
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportDate {
    pub date: NaiveDate,
    /// Folder name as found on disk, e.g. `11-18-2025`
    pub label: String,
}

impl ReportDate {
    /// Parse a `MM-DD-YYYY` label (single-digit month/day accepted)
    pub fn parse(label: &str) -> Option<Self> {
        let date = NaiveDate::parse_from_str(label, "%m-%d-%Y").ok()?;
        Some(Self {
            date,
            label: label.to_string(),
        })
    }

    /// Sheet name for this date: separators become underscores, max 31 chars
    pub fn sheet_name(&self) -> String {
        self.label.replace(['-', '/'], "_").chars().take(31).collect()
    }
}

impl fmt::Display for ReportDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A discovered date folder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFolder {
    pub date: ReportDate,
    pub path: PathBuf,
}

/// The four deployment contexts whose reports are consolidated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    Patikar,
    Batalan,
    Production,
    SharedServices,
}

impl Environment {
    pub const ALL: [Environment; 4] = [
        Environment::Patikar,
        Environment::Batalan,
        Environment::Production,
        Environment::SharedServices,
    ];

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Environment::Patikar => "Patikar",
            Environment::Batalan => "Batalan",
            Environment::Production => "Production",
            Environment::SharedServices => "Shared Services",
        }
    }

    /// Folder name used under each date folder
    pub fn folder_name(self) -> &'static str {
        match self {
            Environment::SharedServices => "Shared_services",
            other => other.name(),
        }
    }

    /// Stem of the consolidated workbook file name
    pub fn output_stem(self) -> &'static str {
        match self {
            Environment::SharedServices => "Shared_Services",
            other => other.name(),
        }
    }

    /// Case-insensitive lookup; `_` and spaces are interchangeable
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().replace('_', " ").to_lowercase();
        Self::ALL
            .into_iter()
            .find(|env| env.name().to_lowercase() == normalized)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Workbook file name for an environment folder name
pub fn workbook_file_name(environment: &str) -> String {
    let stem = match Environment::from_name(environment) {
        Some(env) => env.output_stem(),
        None => environment,
    };
    format!("{stem}_Consolidated.xlsx")
}

// ============================================================================
// Tables through the pipeline
// ============================================================================

/// One loaded service report
#[derive(Clone, Debug, PartialEq)]
pub struct TableSource {
    /// Service name (file stem, e.g. `RDS`)
    pub service: String,
    pub date: ReportDate,
    pub environment: String,
    pub table: Table,
}

/// Recoverable irregularity met while consolidating
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    /// A service report or environment folder is absent for a date
    MissingData,
    /// No identifier column common to all merged sources
    IdentifierMismatch,
    /// No highlight configuration for the environment
    ConfigurationGap,
    /// A report file exists but could not be read
    UnreadableReport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Info,
    Warning,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self.kind {
            NoticeKind::MissingData => Severity::Info,
            NoticeKind::IdentifierMismatch
            | NoticeKind::ConfigurationGap
            | NoticeKind::UnreadableReport => Severity::Warning,
        }
    }
}

/// Horizontal merge of every service report for one date and environment
#[derive(Clone, Debug, PartialEq)]
pub struct WideTable {
    pub date: ReportDate,
    pub environment: String,
    pub table: Table,
    /// Identifier column the rows were aligned on
    pub merge_key: Option<String>,
    /// Rows were aligned by position because no common identifier exists
    pub fallback: bool,
    pub notes: Vec<Notice>,
}

impl WideTable {
    /// A date with nothing to merge
    pub fn empty(date: ReportDate, environment: impl Into<String>, note: Notice) -> Self {
        Self {
            date,
            environment: environment.into(),
            table: Table::default(),
            merge_key: None,
            fallback: false,
            notes: vec![note],
        }
    }
}

/// Per-date table with provenance columns, emitted as its own sheet
#[derive(Clone, Debug, PartialEq)]
pub struct DatedSheet {
    pub date: ReportDate,
    pub table: Table,
}

/// Every date of one environment stacked into `All_Data`
#[derive(Clone, Debug, PartialEq)]
pub struct ConsolidatedTable {
    pub environment: String,
    pub table: Table,
    /// Dates with data, ascending
    pub dates: Vec<DatedSheet>,
}

// ============================================================================
// Highlighting
// ============================================================================

/// Cells to be styled as low utilization, as `(row, column)` pairs
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HighlightSet {
    cells: BTreeSet<(usize, String)>,
}

impl HighlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, row: usize, column: impl Into<String>) -> bool {
        self.cells.insert((row, column.into()))
    }

    pub fn contains(&self, row: usize, column: &str) -> bool {
        self.cells.contains(&(row, column.to_string()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Highlighted cells in one column
    pub fn count_in_column(&self, column: &str) -> usize {
        self.cells.iter().filter(|(_, c)| c == column).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.cells.iter().map(|(r, c)| (*r, c.as_str()))
    }
}

// ============================================================================
// Workbook output
// ============================================================================

/// One output sheet with its highlighted cells
#[derive(Clone, Debug, PartialEq)]
pub struct SheetData {
    pub name: String,
    pub table: Table,
    pub highlights: HighlightSet,
    /// Columns the highlight predicate was evaluated on
    pub highlight_columns: Vec<String>,
}

/// Everything the writer needs for one environment's workbook
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentWorkbook {
    pub environment: String,
    pub file_name: String,
    /// `All_Data` first, then one sheet per date
    pub sheets: Vec<SheetData>,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Finds the date folders under the report root
pub trait FolderDiscovery {
    /// Valid date folders, ascending by date
    fn list_date_folders(&self, root: &Path) -> Result<Vec<DateFolder>, ConsolidateError>;
}

/// Reads service reports into tables
pub trait ReportLoader {
    /// Whether the environment folder exists under a date folder
    fn has_environment(&self, env_dir: &Path) -> bool;

    /// Service names available in an environment folder, sorted
    fn list_services(&self, env_dir: &Path) -> Result<Vec<String>, LoadError>;

    /// Load one service report; `Ok(None)` when the file does not exist
    fn load_service(
        &self,
        env_dir: &Path,
        service: &str,
        date: &ReportDate,
        environment: &str,
    ) -> Result<Option<TableSource>, LoadError>;
}

/// Persists an environment workbook
pub trait WorkbookWriter {
    /// Write the workbook and return its path
    fn write_workbook(&self, workbook: &EnvironmentWorkbook) -> Result<PathBuf, ConsolidateError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Spreadsheet read error
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("spreadsheet {0} has no worksheet")]
    NoWorksheet(PathBuf),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Error that aborts one environment's pipeline
#[derive(Debug, Error)]
pub enum ConsolidateError {
    #[error("no date folders found under {0}")]
    NoDateFolders(PathBuf),

    #[error("cannot scan {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("output file {path} is locked (gave up after {attempts} attempts)")]
    OutputLocked { path: PathBuf, attempts: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_date_parsing() {
        let d = ReportDate::parse("11-18-2025").unwrap();
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2025, 11, 18).unwrap());
        assert_eq!(d.sheet_name(), "11_18_2025");

        let short = ReportDate::parse("1-5-2025").unwrap();
        assert_eq!(short.date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(short.label, "1-5-2025");

        assert!(ReportDate::parse("2025-11-18").is_none());
        assert!(ReportDate::parse("13-01-2025").is_none());
        assert!(ReportDate::parse("notes").is_none());
    }

    #[test]
    fn report_dates_order_by_calendar() {
        let mut dates = vec![
            ReportDate::parse("11-20-2025").unwrap(),
            ReportDate::parse("2-1-2025").unwrap(),
            ReportDate::parse("11-18-2025").unwrap(),
        ];
        dates.sort();
        let labels: Vec<_> = dates.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["2-1-2025", "11-18-2025", "11-20-2025"]);
    }

    #[test]
    fn environment_lookup_is_case_insensitive() {
        assert_eq!(Environment::from_name("PATIKAR"), Some(Environment::Patikar));
        assert_eq!(Environment::from_name("batalan"), Some(Environment::Batalan));
        assert_eq!(Environment::from_name("Shared Services"), Some(Environment::SharedServices));
        assert_eq!(Environment::from_name("Shared_services"), Some(Environment::SharedServices));
        assert_eq!(Environment::from_name("Staging"), None);
    }

    #[test]
    fn workbook_names() {
        assert_eq!(workbook_file_name("Patikar"), "Patikar_Consolidated.xlsx");
        assert_eq!(workbook_file_name("Shared_services"), "Shared_Services_Consolidated.xlsx");
        assert_eq!(workbook_file_name("Staging"), "Staging_Consolidated.xlsx");
    }

    #[test]
    fn notice_severity() {
        assert_eq!(Notice::new(NoticeKind::MissingData, "x").severity(), Severity::Info);
        assert_eq!(Notice::new(NoticeKind::IdentifierMismatch, "x").severity(), Severity::Warning);
    }

    #[test]
    fn highlight_set_queries() {
        let mut set = HighlightSet::new();
        assert!(set.insert(0, "Max CPU"));
        assert!(!set.insert(0, "Max CPU"));
        set.insert(3, "Max CPU");
        set.insert(1, "P95 CPU");
        assert_eq!(set.len(), 3);
        assert!(set.contains(3, "Max CPU"));
        assert!(!set.contains(1, "Max CPU"));
        assert_eq!(set.count_in_column("Max CPU"), 2);
        let rows: Vec<usize> = set.iter().map(|(r, _)| r).collect();
        assert_eq!(rows, vec![0, 1, 3]);
    }
}
