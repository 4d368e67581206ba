//! Consolidated workbook renderer
//!
//! Produces one XLSX file per environment:
//! - `All_Data`: every date stacked, provenance columns last
//! - one `MM_DD_YYYY` sheet per date that has rows
//!
//! Every sheet gets a bold, frozen header row. Cells the formatting engine
//! selected are filled green. Column widths are measured on `All_Data`
//! (`min(longest + 2, 50)`) and applied by column name to every sheet.
//!
//! ## Example Output Structure
//!
//! ```text
//! Sheet: All_Data
//! | InstanceId | Max CPU (%) | Engine | Date_Report | Environment |
//! |------------|-------------|--------|-------------|-------------|
//! | i-01       | 5           | mysql  | 11-18-2025  | Patikar     |   <- 5 filled green
//! | i-02       | 40          |        | 11-19-2025  | Patikar     |
//! ```
//!
//! Bytes are rendered in memory first and only then written to disk, so a
//! locked target never leaves a half-written file behind.

use amsreport_core::config::DEFAULT_OUTPUT_DIR;
use amsreport_core::{
    CellValue, ConsolidateError, EnvironmentWorkbook, RenderError, Settings, SheetData, Table, WorkbookWriter,
};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::retry::{write_with_retry, RetryPolicy};

const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Writes consolidated workbooks with rust_xlsxwriter
#[derive(Clone, Debug)]
pub struct ExcelWorkbookWriter {
    /// Folder the workbooks are written to
    pub output_dir: PathBuf,
    /// Fill color of highlighted cells
    pub highlight_color: u32,
    /// Font color of highlighted cells
    pub highlight_font_color: u32,
    /// Upper bound for auto-sized column widths
    pub max_column_width: f64,
    pub retry: RetryPolicy,
}

impl Default for ExcelWorkbookWriter {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            highlight_color: 0xC6EFCE,
            highlight_font_color: 0x006100,
            max_column_width: 50.0,
            retry: RetryPolicy::default(),
        }
    }
}

/// Formats shared by every sheet of a workbook
struct SheetFormats {
    header: Format,
    highlight: Format,
}

impl ExcelWorkbookWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer configured from resolved settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new()
            .output_dir(settings.output_path())
            .retry(RetryPolicy::new(settings.retry_attempts, settings.retry_delay()))
    }

    /// Set the output folder
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the highlight fill color (`0xRRGGBB`)
    pub fn highlight_color(mut self, color: u32) -> Self {
        self.highlight_color = color;
        self
    }

    /// Set the retry policy for locked outputs
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Path a workbook is written to
    pub fn target_path(&self, workbook: &EnvironmentWorkbook) -> PathBuf {
        self.output_dir.join(&workbook.file_name)
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, workbook: &EnvironmentWorkbook) -> Result<Vec<u8>, RenderError> {
        let Some(all_data) = workbook.sheets.first() else {
            return Err(RenderError::InvalidData(format!(
                "workbook for {} has no sheets",
                workbook.environment
            )));
        };

        let mut book = Workbook::new();
        let created = ExcelDateTime::from_ymd(2000, 1, 1).map_err(|e| RenderError::Format(e.to_string()))?;
        let properties = DocProperties::new()
            .set_title(&format!("{} consolidated report", workbook.environment))
            .set_creation_datetime(&created);
        book.set_properties(&properties);

        let formats = self.create_formats();
        let widths = self.column_widths(&all_data.table);

        for sheet in &workbook.sheets {
            self.add_sheet(&mut book, sheet, &formats, &widths)?;
        }

        let buffer = book
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;

        Ok(buffer)
    }

    fn create_formats(&self) -> SheetFormats {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let highlight = Format::new()
            .set_background_color(self.highlight_color)
            .set_font_color(self.highlight_font_color);

        SheetFormats { header, highlight }
    }

    /// `min(max(header, longest value) + 2, max_column_width)` per column
    pub fn column_widths(&self, table: &Table) -> HashMap<String, f64> {
        table
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let longest = table
                    .rows()
                    .iter()
                    .map(|row| display_len(&row[idx]))
                    .max()
                    .unwrap_or(0)
                    .max(name.chars().count());
                let width = (longest as f64 + 2.0).min(self.max_column_width);
                (name.clone(), width)
            })
            .collect()
    }

    fn add_sheet(
        &self,
        book: &mut Workbook,
        data: &SheetData,
        formats: &SheetFormats,
        widths: &HashMap<String, f64>,
    ) -> Result<(), RenderError> {
        let table = &data.table;
        if table.column_count() > MAX_COLUMNS {
            return Err(RenderError::InvalidData(format!(
                "sheet {} has {} columns, Excel allows {}",
                data.name,
                table.column_count(),
                MAX_COLUMNS
            )));
        }
        if table.row_count() + 1 > MAX_ROWS {
            return Err(RenderError::InvalidData(format!(
                "sheet {} has {} rows, Excel allows {}",
                data.name,
                table.row_count(),
                MAX_ROWS - 1
            )));
        }

        let sheet = book.add_worksheet();
        sheet
            .set_name(&data.name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        for (col, header) in table.columns().iter().enumerate() {
            let col = col as u16;
            sheet
                .write_string_with_format(0, col, header, &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            let width = widths
                .get(header)
                .copied()
                .unwrap_or_else(|| (header.chars().count() as f64 + 2.0).min(self.max_column_width));
            sheet
                .set_column_width(col, width)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for (row_idx, row) in table.rows().iter().enumerate() {
            let excel_row = row_idx as u32 + 1;
            for (col, (value, name)) in row.iter().zip(table.columns()).enumerate() {
                let format = data
                    .highlights
                    .contains(row_idx, name)
                    .then_some(&formats.highlight);
                write_cell(sheet, excel_row, col as u16, value, format)?;
            }
        }

        sheet
            .set_freeze_panes(1, 0)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        debug!(
            "rendered sheet {} ({} rows, {} highlighted cells)",
            data.name,
            table.row_count(),
            data.highlights.len()
        );
        Ok(())
    }
}

fn display_len(value: &CellValue) -> usize {
    match value {
        CellValue::Empty => 0,
        other => other.to_string().chars().count(),
    }
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: Option<&Format>,
) -> Result<(), RenderError> {
    let result = match (value, format) {
        (CellValue::Empty, _) => return Ok(()),
        (CellValue::Number(n), Some(f)) if n.is_finite() => sheet.write_number_with_format(row, col, *n, f),
        (CellValue::Number(n), None) if n.is_finite() => sheet.write_number(row, col, *n),
        (CellValue::Bool(b), Some(f)) => sheet.write_boolean_with_format(row, col, *b, f),
        (CellValue::Bool(b), None) => sheet.write_boolean(row, col, *b),
        (other, Some(f)) => sheet.write_string_with_format(row, col, other.to_string(), f),
        (other, None) => sheet.write_string(row, col, other.to_string()),
    };
    result
        .map(|_| ())
        .map_err(|e| RenderError::Format(e.to_string()))
}

impl WorkbookWriter for ExcelWorkbookWriter {
    fn write_workbook(&self, workbook: &EnvironmentWorkbook) -> Result<PathBuf, ConsolidateError> {
        let bytes = self.render_to_bytes(workbook)?;
        fs::create_dir_all(&self.output_dir)?;
        let path = self.target_path(workbook);
        write_with_retry(&path, &self.retry, |target: &Path| fs::write(target, &bytes))?;
        debug!("wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amsreport_core::HighlightSet;

    fn sheet(name: &str, table: Table) -> SheetData {
        SheetData {
            name: name.into(),
            table,
            highlights: HighlightSet::new(),
            highlight_columns: Vec::new(),
        }
    }

    #[test]
    fn widths_follow_longest_value() {
        let table = Table::from_rows(
            &["Id", "Engine"],
            vec![
                vec!["i-0123456789".into(), CellValue::Empty],
                vec!["i-1".into(), "mysql".into()],
            ],
        );
        let widths = ExcelWorkbookWriter::new().column_widths(&table);
        assert_eq!(widths["Id"], 14.0);
        assert_eq!(widths["Engine"], 8.0);
    }

    #[test]
    fn widths_are_capped() {
        let long = "x".repeat(120);
        let table = Table::from_rows(&["Notes"], vec![vec![long.as_str().into()]]);
        let writer = ExcelWorkbookWriter::new();
        assert_eq!(writer.column_widths(&table)["Notes"], 50.0);
    }

    #[test]
    fn workbook_without_sheets_is_rejected() {
        let workbook = EnvironmentWorkbook {
            environment: "Patikar".into(),
            file_name: "Patikar_Consolidated.xlsx".into(),
            sheets: Vec::new(),
        };
        let err = ExcelWorkbookWriter::new().render_to_bytes(&workbook).unwrap_err();
        assert!(matches!(err, RenderError::InvalidData(_)));
    }

    #[test]
    fn renders_header_only_sheet() {
        let workbook = EnvironmentWorkbook {
            environment: "Batalan".into(),
            file_name: "Batalan_Consolidated.xlsx".into(),
            sheets: vec![sheet("All_Data", Table::new(vec!["Date_Report".into(), "Environment".into()]))],
        };
        let bytes = ExcelWorkbookWriter::new().render_to_bytes(&workbook).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn from_settings_uses_output_path() {
        let settings = Settings {
            base_path: PathBuf::from("/reports"),
            retry_attempts: 5,
            retry_delay_ms: 10,
            ..Settings::default()
        };
        let writer = ExcelWorkbookWriter::from_settings(&settings);
        assert_eq!(writer.output_dir, PathBuf::from("/reports/Consolidated_Reports"));
        assert_eq!(writer.retry.attempts, 5);
        assert_eq!(writer.retry.delay, std::time::Duration::from_millis(10));
    }
}
