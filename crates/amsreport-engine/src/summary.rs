//! Per-run results, one entry per environment

use amsreport_core::{HighlightSet, Notice, SheetData, Table, DATE_REPORT_COLUMN};
use serde::Serialize;
use std::path::PathBuf;

/// How an environment's pipeline ended
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Written { path: PathBuf },
    Skipped { reason: String },
    Failed { error: String },
}

/// Highlight statistics for one column of `All_Data`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ColumnHighlight {
    pub column: String,
    pub highlighted: usize,
    pub numeric: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EnvironmentReport {
    pub environment: String,
    pub outcome: Outcome,
    pub records: usize,
    pub columns: usize,
    /// Row count per `Date_Report` value, in order of appearance
    pub date_distribution: Vec<(String, usize)>,
    pub highlighted_columns: Vec<ColumnHighlight>,
    pub sheets: Vec<String>,
    pub notices: Vec<Notice>,
}

impl EnvironmentReport {
    pub fn skipped(environment: &str, reason: impl Into<String>, notices: Vec<Notice>) -> Self {
        Self::bare(environment, Outcome::Skipped { reason: reason.into() }, notices)
    }

    pub fn failed(environment: &str, error: impl ToString) -> Self {
        Self::bare(
            environment,
            Outcome::Failed {
                error: error.to_string(),
            },
            Vec::new(),
        )
    }

    fn bare(environment: &str, outcome: Outcome, notices: Vec<Notice>) -> Self {
        Self {
            environment: environment.to_string(),
            outcome,
            records: 0,
            columns: 0,
            date_distribution: Vec::new(),
            highlighted_columns: Vec::new(),
            sheets: Vec::new(),
            notices,
        }
    }

    /// Statistics for the `All_Data` sheet
    pub fn describe(environment: &str, outcome: Outcome, all_data: &SheetData, sheets: Vec<String>, notices: Vec<Notice>) -> Self {
        Self {
            environment: environment.to_string(),
            outcome,
            records: all_data.table.row_count(),
            columns: all_data.table.column_count(),
            date_distribution: date_distribution(&all_data.table),
            highlighted_columns: column_highlights(&all_data.table, &all_data.highlight_columns, &all_data.highlights),
            sheets,
            notices,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

fn date_distribution(table: &Table) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in table.column_values(DATE_REPORT_COLUMN) {
        let label = value.to_string();
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    counts
}

fn column_highlights(table: &Table, columns: &[String], highlights: &HighlightSet) -> Vec<ColumnHighlight> {
    columns
        .iter()
        .map(|column| ColumnHighlight {
            column: column.clone(),
            highlighted: highlights.count_in_column(column),
            numeric: table
                .column_values(column)
                .filter(|v| v.as_number().is_some())
                .count(),
        })
        .collect()
}

/// Results of a whole run
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub base_path: PathBuf,
    pub date_folders: Vec<String>,
    pub environments: Vec<EnvironmentReport>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.environments.iter().any(EnvironmentReport::is_failure)
    }

    /// Environments that produced a workbook
    pub fn written(&self) -> impl Iterator<Item = &EnvironmentReport> {
        self.environments
            .iter()
            .filter(|e| matches!(e.outcome, Outcome::Written { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn describes_all_data() {
        let table = Table::from_rows(
            &["Max CPU (%)", "Date_Report"],
            vec![
                vec![5.into(), "11-18-2025".into()],
                vec!["N/A".into(), "11-18-2025".into()],
                vec![40.into(), "11-19-2025".into()],
            ],
        );
        let mut highlights = HighlightSet::new();
        highlights.insert(0, "Max CPU (%)");
        let sheet = SheetData {
            name: "All_Data".into(),
            table,
            highlights,
            highlight_columns: vec!["Max CPU (%)".into()],
        };

        let report = EnvironmentReport::describe(
            "Patikar",
            Outcome::Written { path: PathBuf::from("out.xlsx") },
            &sheet,
            vec!["All_Data".into()],
            Vec::new(),
        );
        assert_eq!(report.records, 3);
        assert_eq!(report.columns, 2);
        assert_eq!(
            report.date_distribution,
            vec![("11-18-2025".to_string(), 2), ("11-19-2025".to_string(), 1)]
        );
        assert_eq!(
            report.highlighted_columns,
            vec![ColumnHighlight {
                column: "Max CPU (%)".into(),
                highlighted: 1,
                numeric: 2,
            }]
        );
        assert!(!report.is_failure());
    }

    #[test]
    fn failures_are_detected() {
        let summary = RunSummary {
            base_path: PathBuf::from("."),
            date_folders: vec!["11-18-2025".into()],
            environments: vec![
                EnvironmentReport::skipped("Batalan", "absent", Vec::new()),
                EnvironmentReport::failed("Production", "locked"),
            ],
        };
        assert!(summary.has_failures());
        assert_eq!(summary.written().count(), 0);
    }
}
