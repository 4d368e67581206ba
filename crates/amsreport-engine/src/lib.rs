//! # amsreport-engine
//!
//! Consolidation engine for per-environment utilization reports.
//!
//! This crate provides:
//! - [`HorizontalMerger`]: same-date service reports → one wide table
//! - [`DateConcatenator`]: wide tables across dates → `All_Data`
//! - [`HighlightSelector`] and [`FormattingEngine`]: low-utilization cells
//! - [`Consolidator`]: the per-environment pipeline with failure isolation
//!
//! ## Example
//!
//! ```rust,ignore
//! use amsreport_core::Settings;
//! use amsreport_engine::Consolidator;
//! use amsreport_loader::{DateFolderScanner, XlsxReportLoader};
//! use amsreport_render::ExcelWorkbookWriter;
//!
//! let settings = Settings::default();
//! let consolidator = Consolidator::new(
//!     &settings,
//!     DateFolderScanner::new().ignore("Consolidated_Reports"),
//!     XlsxReportLoader::new(),
//!     ExcelWorkbookWriter::from_settings(&settings),
//! );
//! let summary = consolidator.run();
//! ```

pub mod concat;
pub mod format;
pub mod highlight;
pub mod merge;
pub mod orchestrator;
pub mod summary;

pub use concat::DateConcatenator;
pub use format::FormattingEngine;
pub use highlight::{configured_columns, select_columns, HighlightSelector};
pub use merge::HorizontalMerger;
pub use orchestrator::{Consolidation, Consolidator};
pub use summary::{ColumnHighlight, EnvironmentReport, Outcome, RunSummary};
