//! Vertical concatenation across dates

use amsreport_core::{
    CellValue, ConsolidatedTable, DatedSheet, Table, WideTable, BOOKKEEPING_COLUMNS, DATE_REPORT_COLUMN,
    ENVIRONMENT_COLUMN,
};

/// Stacks one environment's wide tables into `All_Data`
#[derive(Clone, Copy, Debug, Default)]
pub struct DateConcatenator;

impl DateConcatenator {
    pub fn new() -> Self {
        Self
    }

    /// The wide table with bookkeeping columns removed and provenance appended
    pub fn with_provenance(wide: &WideTable) -> Table {
        let mut table = wide.table.clone();
        for column in BOOKKEEPING_COLUMNS
            .iter()
            .chain(&[DATE_REPORT_COLUMN, ENVIRONMENT_COLUMN])
        {
            table.drop_column(column);
        }
        table.set_column(DATE_REPORT_COLUMN, CellValue::from(wide.date.label.as_str()));
        table.set_column(ENVIRONMENT_COLUMN, CellValue::from(wide.environment.as_str()));
        table
    }

    /// Concatenate date-ordered wide tables.
    ///
    /// The column set is the union over all dates in first-seen order, with
    /// the provenance columns last. Dates without rows contribute columns but
    /// no sheet.
    pub fn concatenate(&self, environment: &str, mut wide_tables: Vec<WideTable>) -> ConsolidatedTable {
        wide_tables.sort_by(|a, b| a.date.cmp(&b.date));

        let tables: Vec<(&WideTable, Table)> = wide_tables
            .iter()
            .map(|wide| (wide, Self::with_provenance(wide)))
            .collect();

        let mut columns: Vec<String> = Vec::new();
        for (_, table) in &tables {
            for column in table.columns() {
                if column != DATE_REPORT_COLUMN && column != ENVIRONMENT_COLUMN && !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }
        columns.push(DATE_REPORT_COLUMN.to_string());
        columns.push(ENVIRONMENT_COLUMN.to_string());

        let mut all_data = Table::new(columns);
        let mut dates = Vec::new();
        for (wide, table) in tables {
            if table.is_empty() {
                continue;
            }
            all_data.extend_aligned(&table);
            dates.push(DatedSheet {
                date: wide.date.clone(),
                table,
            });
        }

        ConsolidatedTable {
            environment: environment.to_string(),
            table: all_data,
            dates,
        }
    }
}
