//! Low-utilization cell detection

use amsreport_core::{HighlightSet, Table};

/// Finds numeric cells inside an inclusive range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FormattingEngine {
    pub low: f64,
    pub high: f64,
}

impl Default for FormattingEngine {
    fn default() -> Self {
        Self { low: 0.0, high: 14.0 }
    }
}

impl FormattingEngine {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn in_range(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }

    /// Cells of `target_columns` whose numeric value lies in `[low, high]`.
    ///
    /// Empty and non-numeric cells are never included; target columns the
    /// table lacks are ignored.
    pub fn compute_highlights(&self, table: &Table, target_columns: &[String]) -> HighlightSet {
        let mut set = HighlightSet::new();
        for column in target_columns {
            for (row, value) in table.column_values(column).enumerate() {
                if value.as_number().is_some_and(|v| self.in_range(v)) {
                    set.insert(row, column.as_str());
                }
            }
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amsreport_core::CellValue;

    fn single_column(values: Vec<CellValue>) -> Table {
        Table::from_rows(&["Max CPU (%)"], values.into_iter().map(|v| vec![v]).collect())
    }

    #[test]
    fn range_is_inclusive() {
        let table = single_column(vec![
            0.into(),
            14.into(),
            14.0001.into(),
            (-0.0001).into(),
            7.5.into(),
        ]);
        let set = FormattingEngine::default().compute_highlights(&table, &["Max CPU (%)".to_string()]);
        assert!(set.contains(0, "Max CPU (%)"));
        assert!(set.contains(1, "Max CPU (%)"));
        assert!(!set.contains(2, "Max CPU (%)"));
        assert!(!set.contains(3, "Max CPU (%)"));
        assert!(set.contains(4, "Max CPU (%)"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn non_numeric_cells_are_skipped() {
        let table = single_column(vec![
            "N/A".into(),
            CellValue::Empty,
            "".into(),
            CellValue::Bool(false),
            "5%".into(),
            " 12 ".into(),
        ]);
        let set = FormattingEngine::default().compute_highlights(&table, &["Max CPU (%)".to_string()]);
        let rows: Vec<usize> = set.iter().map(|(r, _)| r).collect();
        assert_eq!(rows, vec![4, 5]);
    }

    #[test]
    fn only_target_columns_are_checked() {
        let table = Table::from_rows(&["A", "B"], vec![vec![1.into(), 2.into()]]);
        let set = FormattingEngine::default().compute_highlights(&table, &["B".to_string(), "Missing".to_string()]);
        assert_eq!(set.len(), 1);
        assert!(set.contains(0, "B"));
    }

    #[test]
    fn custom_bounds() {
        let engine = FormattingEngine::new(10.0, 20.0);
        assert!(!engine.in_range(9.99));
        assert!(engine.in_range(10.0));
        assert!(engine.in_range(20.0));
        assert!(!engine.in_range(20.5));
    }
}
