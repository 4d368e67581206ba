//! Run summary output for the terminal and for machines

use amsreport_engine::{EnvironmentReport, Outcome, RunSummary};
use anyhow::Result;

/// Verification report, one block per environment
pub fn render_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Base path: {}\n", summary.base_path.display()));
    if summary.date_folders.is_empty() {
        out.push_str("No date folders found\n");
    } else {
        out.push_str(&format!("Date folders: {}\n", summary.date_folders.join(", ")));
    }

    for report in &summary.environments {
        out.push('\n');
        write_environment(&mut out, report);
    }

    let written = summary.written().count();
    out.push_str(&format!(
        "\n{written} of {} environment(s) consolidated\n",
        summary.environments.len()
    ));
    out
}

fn write_environment(out: &mut String, report: &EnvironmentReport) {
    out.push_str(&format!("== {} ==\n", report.environment));
    match &report.outcome {
        Outcome::Written { path } => {
            out.push_str(&format!("  output: {}\n", path.display()));
        }
        Outcome::Skipped { reason } => {
            out.push_str(&format!("  skipped: {reason}\n"));
        }
        Outcome::Failed { error } => {
            out.push_str(&format!("  FAILED: {error}\n"));
        }
    }

    if report.records > 0 || report.columns > 0 {
        out.push_str(&format!("  records: {}, columns: {}\n", report.records, report.columns));
    }
    if !report.date_distribution.is_empty() {
        out.push_str("  records by date:\n");
        for (date, count) in &report.date_distribution {
            out.push_str(&format!("    {date}: {count}\n"));
        }
    }
    if !report.highlighted_columns.is_empty() {
        out.push_str("  highlighted columns:\n");
        for column in &report.highlighted_columns {
            out.push_str(&format!(
                "    {}: {}/{} cells\n",
                column.column, column.highlighted, column.numeric
            ));
        }
    }
    if !report.sheets.is_empty() {
        out.push_str(&format!("  sheets: {}\n", report.sheets.join(", ")));
    }
    for notice in &report.notices {
        out.push_str(&format!("  note: {}\n", notice.message));
    }
}

pub fn render_json(summary: &RunSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
