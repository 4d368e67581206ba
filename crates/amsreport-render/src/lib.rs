//! # amsreport-render
//!
//! Workbook output for consolidated utilization reports.
//!
//! This crate provides:
//! - [`ExcelWorkbookWriter`]: one XLSX per environment with highlighted cells
//! - [`RetryPolicy`] and [`write_with_retry`]: waiting out locked output files
//!
//! ## Example
//!
//! ```rust,ignore
//! use amsreport_core::WorkbookWriter;
//! use amsreport_render::ExcelWorkbookWriter;
//!
//! let writer = ExcelWorkbookWriter::new().output_dir("Consolidated_Reports");
//! let path = writer.write_workbook(&workbook)?;
//! ```

pub mod excel;
pub mod retry;

pub use excel::ExcelWorkbookWriter;
pub use retry::{is_locked, write_with_retry, RetryPolicy};
