//! Per-environment consolidation pipeline
//!
//! For every configured environment, in order:
//!
//! 1. find the environment folder under each date folder
//! 2. load and horizontally merge the service reports of each date
//! 3. stack the dates into `All_Data`
//! 4. select highlight columns and compute highlighted cells for every sheet
//! 5. hand the workbook to the writer
//!
//! A failure in one environment is logged and recorded; the remaining
//! environments still run.

use amsreport_core::{
    workbook_file_name, ConsolidateError, ConsolidatedTable, DateFolder, EnvironmentWorkbook, FolderDiscovery,
    Notice, NoticeKind, ReportLoader, Settings, Severity, SheetData, Table, TableSource, WideTable,
    WorkbookWriter, ALL_DATA_SHEET,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::concat::DateConcatenator;
use crate::format::FormattingEngine;
use crate::highlight::HighlightSelector;
use crate::merge::HorizontalMerger;
use crate::summary::{EnvironmentReport, Outcome, RunSummary};

/// In-memory result of consolidating one environment
#[derive(Clone, Debug, PartialEq)]
pub struct Consolidation {
    pub consolidated: ConsolidatedTable,
    pub workbook: EnvironmentWorkbook,
    pub notices: Vec<Notice>,
}

/// Drives the pipeline over every environment
pub struct Consolidator<D, L, W> {
    discovery: D,
    loader: L,
    writer: W,
    base_path: PathBuf,
    environments: Vec<String>,
    merger: HorizontalMerger,
    concatenator: DateConcatenator,
    selector: HighlightSelector,
    engine: FormattingEngine,
}

impl<D, L, W> Consolidator<D, L, W>
where
    D: FolderDiscovery,
    L: ReportLoader,
    W: WorkbookWriter,
{
    pub fn new(settings: &Settings, discovery: D, loader: L, writer: W) -> Self {
        Self {
            discovery,
            loader,
            writer,
            base_path: settings.base_path.clone(),
            environments: settings.environments.clone(),
            merger: HorizontalMerger::new(settings.identifier_columns.clone()),
            concatenator: DateConcatenator::new(),
            selector: HighlightSelector::new(settings.highlight_mode),
            engine: FormattingEngine::new(settings.highlight_low, settings.highlight_high),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Process every environment and report what happened to each
    pub fn run(&self) -> RunSummary {
        let mut summary = RunSummary {
            base_path: self.base_path.clone(),
            ..RunSummary::default()
        };

        let folders = match self.discovery.list_date_folders(&self.base_path) {
            Ok(folders) => folders,
            Err(e) => {
                error!("{}", e);
                summary.environments = self
                    .environments
                    .iter()
                    .map(|env| EnvironmentReport::failed(env, &e))
                    .collect();
                return summary;
            }
        };
        summary.date_folders = folders.iter().map(|f| f.date.label.clone()).collect();

        if folders.is_empty() {
            let e = ConsolidateError::NoDateFolders(self.base_path.clone());
            warn!("{}", e);
            summary.environments = self
                .environments
                .iter()
                .map(|env| EnvironmentReport::skipped(env, e.to_string(), Vec::new()))
                .collect();
            return summary;
        }

        info!("found date folders: {}", summary.date_folders.join(", "));
        info!("processing environments: {}", self.environments.join(", "));

        for environment in &self.environments {
            info!("processing environment: {}", environment);
            let report = match self.process_environment(environment, &folders) {
                Ok(report) => report,
                Err(e) => {
                    error!("{}: {}", environment, e);
                    EnvironmentReport::failed(environment, e)
                }
            };
            summary.environments.push(report);
        }
        summary
    }

    fn process_environment(&self, environment: &str, folders: &[DateFolder]) -> Result<EnvironmentReport, ConsolidateError> {
        if !folders.iter().any(|f| self.loader.has_environment(&f.path.join(environment))) {
            let notice = Notice::new(
                NoticeKind::MissingData,
                format!("environment '{environment}' not found in any date folder"),
            );
            info!("{}", notice.message);
            return Ok(EnvironmentReport::skipped(environment, notice.message.clone(), vec![notice]));
        }

        let Consolidation { workbook, notices, .. } = self.consolidate(environment, folders)?;
        let sheet_names: Vec<String> = workbook.sheets.iter().map(|s| s.name.clone()).collect();

        let outcome = match self.writer.write_workbook(&workbook) {
            Ok(path) => {
                info!("created {}", path.display());
                Outcome::Written { path }
            }
            Err(e) => {
                error!("{}: {}", environment, e);
                Outcome::Failed { error: e.to_string() }
            }
        };

        match workbook.sheets.first() {
            Some(all_data) => Ok(EnvironmentReport::describe(environment, outcome, all_data, sheet_names, notices)),
            None => Ok(EnvironmentReport::failed(environment, "workbook has no sheets")),
        }
    }

    /// Merge, stack and highlight one environment without writing anything
    pub fn consolidate(&self, environment: &str, folders: &[DateFolder]) -> Result<Consolidation, ConsolidateError> {
        let mut notices = Vec::new();
        let mut wide_tables = Vec::with_capacity(folders.len());
        for folder in folders {
            info!("processing date: {}", folder.date);
            let wide = self.merge_date(environment, folder)?;
            if wide.table.is_empty() {
                info!("no data found for {}", folder.date);
            } else {
                info!(
                    "found {} records with {} columns",
                    wide.table.row_count(),
                    wide.table.column_count()
                );
            }
            for notice in &wide.notes {
                log_notice(notice);
            }
            notices.extend(wide.notes.iter().cloned());
            wide_tables.push(wide);
        }

        let consolidated = self.concatenator.concatenate(environment, wide_tables);
        info!(
            "total for {}: {} records, {} columns",
            environment,
            consolidated.table.row_count(),
            consolidated.table.column_count()
        );

        if !self.selector.knows(environment) {
            let notice = Notice::new(
                NoticeKind::ConfigurationGap,
                format!("no highlight columns configured for environment '{environment}'"),
            );
            log_notice(&notice);
            notices.push(notice);
        }

        let mut sheets = Vec::with_capacity(consolidated.dates.len() + 1);
        sheets.push(self.highlighted_sheet(environment, ALL_DATA_SHEET.to_string(), &consolidated.table));
        for dated in &consolidated.dates {
            sheets.push(self.highlighted_sheet(environment, dated.date.sheet_name(), &dated.table));
        }

        let workbook = EnvironmentWorkbook {
            environment: environment.to_string(),
            file_name: workbook_file_name(environment),
            sheets,
        };

        Ok(Consolidation {
            consolidated,
            workbook,
            notices,
        })
    }

    fn highlighted_sheet(&self, environment: &str, name: String, table: &Table) -> SheetData {
        let columns = self.selector.select(environment, table);
        if columns.is_empty() {
            info!("no target utilization columns found in sheet {}", name);
        } else {
            info!("highlighting columns in {}: {}", name, columns.join(", "));
        }
        let highlights = self.engine.compute_highlights(table, &columns);
        SheetData {
            name,
            table: table.clone(),
            highlights,
            highlight_columns: columns,
        }
    }

    /// Load every service report of one date and merge them
    fn merge_date(&self, environment: &str, folder: &DateFolder) -> Result<WideTable, ConsolidateError> {
        let env_dir = folder.path.join(environment);
        if !self.loader.has_environment(&env_dir) {
            return Ok(WideTable::empty(
                folder.date.clone(),
                environment,
                Notice::new(
                    NoticeKind::MissingData,
                    format!("no {environment} folder for {}", folder.date),
                ),
            ));
        }

        let services = self.loader.list_services(&env_dir)?;
        if services.is_empty() {
            return Ok(WideTable::empty(
                folder.date.clone(),
                environment,
                Notice::new(
                    NoticeKind::MissingData,
                    format!("no Excel files found in {}", env_dir.display()),
                ),
            ));
        }

        let mut load_notes = Vec::new();
        let mut sources: Vec<TableSource> = Vec::with_capacity(services.len());
        for service in &services {
            match self.loader.load_service(&env_dir, service, &folder.date, environment) {
                Ok(Some(source)) => {
                    info!("read {} ({} rows)", service, source.table.row_count());
                    sources.push(source);
                }
                Ok(None) => load_notes.push(Notice::new(
                    NoticeKind::MissingData,
                    format!("{service} report absent for {environment} on {}", folder.date),
                )),
                Err(e) => load_notes.push(Notice::new(
                    NoticeKind::UnreadableReport,
                    format!("skipping {service} for {environment} on {}: {e}", folder.date),
                )),
            }
        }

        let mut wide = self.merger.merge(sources, &folder.date, environment);
        load_notes.append(&mut wide.notes);
        wide.notes = load_notes;
        Ok(wide)
    }
}

fn log_notice(notice: &Notice) {
    match notice.severity() {
        Severity::Info => info!("{}", notice.message),
        Severity::Warning => warn!("{}", notice.message),
    }
}
