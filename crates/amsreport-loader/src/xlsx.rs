//! Service report reader
//!
//! Each report is a single `.xlsx` file named after its service (`RDS.xlsx`,
//! `EC2.xlsx`, ...). The first worksheet is read; its first row is the header.

use amsreport_core::{CellValue, LoadError, ReportDate, ReportLoader, Table, TableSource};
use calamine::{open_workbook, Data, DataType, Reader, Xlsx};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const REPORT_EXTENSION: &str = "xlsx";

/// Prefix Office uses for lock files next to an open workbook
const LOCK_FILE_PREFIX: &str = "~$";

/// Reads `<service>.xlsx` files with calamine
#[derive(Clone, Debug, Default)]
pub struct XlsxReportLoader;

impl XlsxReportLoader {
    pub fn new() -> Self {
        Self
    }

    /// Read the first worksheet of a spreadsheet into a table
    pub fn read_table(path: &Path) -> Result<Table, LoadError> {
        let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: calamine::XlsxError| LoadError::Spreadsheet {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LoadError::NoWorksheet(path.to_path_buf()))?
            .map_err(|e| LoadError::Spreadsheet {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Table::default());
        };
        let columns = header_names(header);

        let mut table = Table::new(columns);
        for row in rows {
            let values: Vec<CellValue> = row.iter().map(cell_value).collect();
            if values.iter().all(CellValue::is_empty) {
                continue;
            }
            table.push_row(values);
        }
        Ok(table)
    }

    /// Report files in `env_dir` as `(service, path)`, sorted by service.
    ///
    /// The extension matches in any letter case; Office lock files are skipped.
    fn report_files(env_dir: &Path) -> Result<Vec<(String, PathBuf)>, LoadError> {
        let mut reports = Vec::new();
        for entry in std::fs::read_dir(env_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_report = path
                .extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION));
            if !is_report {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with(LOCK_FILE_PREFIX) {
                debug!("skipping lock file {}", path.display());
                continue;
            }
            reports.push((stem.to_string(), path));
        }
        reports.sort();
        Ok(reports)
    }
}

impl ReportLoader for XlsxReportLoader {
    fn list_services(&self, env_dir: &Path) -> Result<Vec<String>, LoadError> {
        let mut services: Vec<String> = Self::report_files(env_dir)?
            .into_iter()
            .map(|(service, _)| service)
            .collect();
        services.dedup();
        Ok(services)
    }

    fn has_environment(&self, env_dir: &Path) -> bool {
        env_dir.is_dir()
    }

    fn load_service(
        &self,
        env_dir: &Path,
        service: &str,
        date: &ReportDate,
        environment: &str,
    ) -> Result<Option<TableSource>, LoadError> {
        if !env_dir.is_dir() {
            return Ok(None);
        }
        let Some((_, path)) = Self::report_files(env_dir)?
            .into_iter()
            .find(|(name, _)| name == service)
        else {
            return Ok(None);
        };
        debug!("reading {}", path.display());
        let table = Self::read_table(&path)?;
        Ok(Some(TableSource {
            service: service.to_string(),
            date: date.clone(),
            environment: environment.to_string(),
            table,
        }))
    }
}

/// Header names with blanks named `Unnamed: <index>` and repeats suffixed `.1`, `.2`
fn header_names(header: &[Data]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let raw = match cell_value(cell) {
                CellValue::Empty => format!("Unnamed: {idx}"),
                other => other.to_string().trim().to_string(),
            };
            let count = seen.entry(raw.clone()).or_insert(0);
            let name = if *count == 0 { raw } else { format!("{raw}.{count}") };
            *count += 1;
            name
        })
        .collect()
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(_) => match data.as_datetime() {
            Some(dt) => CellValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Text(data.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
