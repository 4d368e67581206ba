//! Horizontal merge
//!
//! Combines every service report of one date and environment into a single
//! wide table. Rows are aligned on the first identifier column shared by all
//! sources that have data; without one, rows are aligned by position.
//!
//! Column naming depends on merge order only: the identifier column comes
//! first, then every other column in first-seen order. A column name already
//! taken by an earlier source gets the suffix `_dup_<i>`, `i` being the
//! position of the source in the merge (so the second source yields `_dup_1`).

use amsreport_core::{CellValue, Notice, NoticeKind, ReportDate, Settings, Table, TableSource, WideTable};
use std::collections::{HashMap, HashSet};

/// Merges same-date, same-environment service reports
#[derive(Clone, Debug)]
pub struct HorizontalMerger {
    /// Candidate identifier columns, highest priority first
    identifier_columns: Vec<String>,
}

impl Default for HorizontalMerger {
    fn default() -> Self {
        Self::new(Settings::default().identifier_columns)
    }
}

/// Where each source column lands in the merged table
struct ColumnPlan {
    columns: Vec<String>,
    /// Per source: output index of each of its columns (`None` for the key)
    targets: Vec<Vec<Option<usize>>>,
    /// Per source: index of the key column in that source
    key_positions: Vec<Option<usize>>,
}

impl HorizontalMerger {
    pub fn new(identifier_columns: Vec<String>) -> Self {
        Self { identifier_columns }
    }

    pub fn identifier_columns(&self) -> &[String] {
        &self.identifier_columns
    }

    /// First candidate identifier present in every source that has rows.
    ///
    /// When no source has rows, every source is considered. Matching is
    /// case-sensitive.
    pub fn resolve_key(&self, sources: &[TableSource]) -> Option<String> {
        let with_data: Vec<&TableSource> = sources.iter().filter(|s| !s.table.is_empty()).collect();
        let considered: Vec<&TableSource> = if with_data.is_empty() {
            sources.iter().collect()
        } else {
            with_data
        };
        if considered.is_empty() {
            return None;
        }
        self.identifier_columns
            .iter()
            .find(|candidate| considered.iter().all(|s| s.table.has_column(candidate)))
            .cloned()
    }

    /// Merge `sources` (in the given order) into one wide table
    pub fn merge(&self, sources: Vec<TableSource>, date: &ReportDate, environment: &str) -> WideTable {
        if sources.is_empty() {
            return WideTable::empty(
                date.clone(),
                environment,
                Notice::new(
                    NoticeKind::MissingData,
                    format!("no service reports for {environment} on {date}"),
                ),
            );
        }

        let key = self.resolve_key(&sources);
        let plan = plan_columns(&sources, key.as_deref());
        let populated = sources.iter().filter(|s| !s.table.is_empty()).count();

        let mut notes = Vec::new();
        let table = match &key {
            Some(_) => merge_on_key(&sources, &plan),
            None => {
                if populated > 1 {
                    let services: Vec<&str> = sources.iter().map(|s| s.service.as_str()).collect();
                    notes.push(Notice::new(
                        NoticeKind::IdentifierMismatch,
                        format!(
                            "no common identifier across {} for {environment} on {date}; rows aligned by position",
                            services.join(", ")
                        ),
                    ));
                }
                merge_by_position(&sources, &plan)
            }
        };

        WideTable {
            date: date.clone(),
            environment: environment.to_string(),
            fallback: key.is_none() && populated > 0,
            merge_key: key,
            table,
            notes,
        }
    }
}

fn plan_columns(sources: &[TableSource], key: Option<&str>) -> ColumnPlan {
    let mut columns: Vec<String> = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    if let Some(key) = key {
        columns.push(key.to_string());
        taken.insert(key.to_string());
    }

    let mut targets = Vec::with_capacity(sources.len());
    let mut key_positions = Vec::with_capacity(sources.len());
    for (position, source) in sources.iter().enumerate() {
        let key_position = key.and_then(|k| source.table.column_index(k));
        let mut source_targets = Vec::with_capacity(source.table.column_count());
        for (idx, name) in source.table.columns().iter().enumerate() {
            if Some(idx) == key_position {
                source_targets.push(None);
                continue;
            }
            let name = if taken.contains(name) {
                let mut n = position.max(1);
                loop {
                    let candidate = format!("{name}_dup_{n}");
                    if !taken.contains(&candidate) {
                        break candidate;
                    }
                    n += 1;
                }
            } else {
                name.clone()
            };
            taken.insert(name.clone());
            columns.push(name);
            source_targets.push(Some(columns.len() - 1));
        }
        targets.push(source_targets);
        key_positions.push(key_position);
    }

    ColumnPlan {
        columns,
        targets,
        key_positions,
    }
}

/// Fill `slot` unless an earlier source already gave it a value
fn fill(slot: &mut CellValue, value: &CellValue) {
    if slot.is_empty() && !value.is_empty() {
        *slot = value.clone();
    }
}

fn merge_on_key(sources: &[TableSource], plan: &ColumnPlan) -> Table {
    let width = plan.columns.len();
    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (position, source) in sources.iter().enumerate() {
        let key_position = plan.key_positions[position];
        for row in source.table.rows() {
            let key_value = key_position.map(|k| &row[k]);
            let row_idx = match key_value {
                Some(value) if !value.is_empty() => {
                    let key_text = value.to_string().trim().to_string();
                    *by_key.entry(key_text).or_insert_with(|| {
                        rows.push(vec![CellValue::Empty; width]);
                        rows.len() - 1
                    })
                }
                // No identifier to align on: the row stands alone
                _ => {
                    rows.push(vec![CellValue::Empty; width]);
                    rows.len() - 1
                }
            };

            let out = &mut rows[row_idx];
            if let Some(value) = key_value {
                fill(&mut out[0], value);
            }
            for (src_idx, target) in plan.targets[position].iter().enumerate() {
                if let Some(target) = target {
                    fill(&mut out[*target], &row[src_idx]);
                }
            }
        }
    }

    Table::from_rows(plan.columns.as_slice(), rows)
}

fn merge_by_position(sources: &[TableSource], plan: &ColumnPlan) -> Table {
    let height = sources.iter().map(|s| s.table.row_count()).max().unwrap_or(0);
    let mut rows = vec![vec![CellValue::Empty; plan.columns.len()]; height];

    for (position, source) in sources.iter().enumerate() {
        for (row_idx, row) in source.table.rows().iter().enumerate() {
            for (src_idx, target) in plan.targets[position].iter().enumerate() {
                if let Some(target) = target {
                    rows[row_idx][*target] = row[src_idx].clone();
                }
            }
        }
    }

    Table::from_rows(plan.columns.as_slice(), rows)
}
