//! Highlight column selection
//!
//! Two policies decide which columns are checked for low utilization:
//!
//! - **Static** (default): a fixed column list per environment. Production
//!   and Shared Services repeat the Patikar/Batalan CPU columns and add their
//!   own; the lists are spelled out in full rather than derived.
//! - **Patterns**: any column whose name looks like a max/p95 metric and
//!   whose values are all numeric.

use amsreport_core::{Environment, HighlightMode, Table};

const PATIKAR_COLUMNS: &[&str] = &[
    "Current CPUUtilization (%)",
    "Max CPUUtilization (%)",
    "P95 CPUUtilization (%)",
    "Max CPU (%)",
    "P95 CPU (%)",
];

const BATALAN_COLUMNS: &[&str] = &[
    "Current CPUUtilization (%)",
    "Max CPUUtilization (%)",
    "P95 CPUUtilization (%)",
    "Max CPU (%)",
    "P95 CPU (%)",
];

const PRODUCTION_COLUMNS: &[&str] = &[
    "Current CPUUtilization (%)",
    "Max CPUUtilization (%)",
    "P95 CPUUtilization (%)",
    "Max CPU (%)",
    "P95 CPU (%)",
    "Current CPUUtilization (%)_dup_1",
    "Max CPUUtilization (%)_dup_1",
    "P95 CPUUtilization (%)_dup_1",
    "Current CPUUtilization (%)_dup_2",
    "Max CPUUtilization (%)_dup_2",
    "Max EngineCPUUtilization (%)",
    "P95 EngineCPUUtilization (%)",
    "Max Broker CPU User (%)",
    "Max Broker CPU System (%)",
    "Max Broker Memory Used (%)",
];

const SHARED_SERVICES_COLUMNS: &[&str] = &[
    "Current CPUUtilization (%)",
    "Max CPUUtilization (%)",
    "P95 CPUUtilization (%)",
    "Max CPU (%)",
    "P95 CPU (%)",
    "Current CPUUtilization (%)_dup_1",
    "Max CPUUtilization (%)_dup_1",
    "P95 CPUUtilization (%)_dup_1",
    "Max EngineCPUUtilization (%)",
    "P95 EngineCPUUtilization (%)",
    "Max DatabaseMemoryUsagePercentage (%)",
    "P95 DatabaseMemoryUsagePercentage (%)",
    "Max EngineMemoryUtilization (%)",
];

/// Name fragments of metrics worth highlighting (lower case)
const TARGET_PATTERNS: &[&str] = &[
    "max cpu",
    "cpu max",
    "max memory",
    "memory max",
    "p95cpu",
    "p95 cpu",
    "cpu p95",
    "p95 memory",
    "memory p95",
    "p95 disk",
    "disk p95",
    "max connection",
    "connection max",
];

/// Name fragments that disqualify a column even when a target matches
const EXCLUDE_PATTERNS: &[&str] = &[
    "vcpu",
    "cpumin",
    "cpuaverage",
    "cpu average",
    "average freeable memory",
    "average freeable",
    "instance specs",
    "cpu min",
    "memory min",
    "current",
    "average",
];

/// Static highlight columns for an environment, in configured order
pub fn configured_columns(environment: Environment) -> &'static [&'static str] {
    match environment {
        Environment::Patikar => PATIKAR_COLUMNS,
        Environment::Batalan => BATALAN_COLUMNS,
        Environment::Production => PRODUCTION_COLUMNS,
        Environment::SharedServices => SHARED_SERVICES_COLUMNS,
    }
}

/// Configured columns of `environment` that exist in `available`.
///
/// Unknown environments select nothing.
pub fn select_columns(environment: &str, available: &[String]) -> Vec<String> {
    let Some(env) = Environment::from_name(environment) else {
        return Vec::new();
    };
    configured_columns(env)
        .iter()
        .filter(|name| available.iter().any(|a| a == *name))
        .map(|name| (*name).to_string())
        .collect()
}

/// True when a column name looks like a max/p95 utilization metric
pub fn matches_patterns(column: &str) -> bool {
    let lower = column.to_lowercase();
    if EXCLUDE_PATTERNS.iter().any(|p| lower.contains(p)) {
        return false;
    }
    TARGET_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Pattern-matched columns whose non-empty cells are all numeric
pub fn select_pattern_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|column| matches_patterns(column))
        .filter(|column| {
            table
                .column_values(column)
                .filter(|v| !v.is_empty())
                .all(|v| v.as_number().is_some())
        })
        .cloned()
        .collect()
}

/// Chooses highlight columns for a table
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HighlightSelector {
    mode: HighlightMode,
}

impl HighlightSelector {
    pub fn new(mode: HighlightMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> HighlightMode {
        self.mode
    }

    /// Whether `environment` can be served by this selector
    pub fn knows(&self, environment: &str) -> bool {
        match self.mode {
            HighlightMode::Static => Environment::from_name(environment).is_some(),
            HighlightMode::Patterns => true,
        }
    }

    pub fn select(&self, environment: &str, table: &Table) -> Vec<String> {
        match self.mode {
            HighlightMode::Static => select_columns(environment, table.columns()),
            HighlightMode::Patterns => select_pattern_columns(table),
        }
    }
}
