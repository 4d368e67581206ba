//! # amsreport-loader
//!
//! Input side of the consolidator.
//!
//! This crate provides:
//! - [`DateFolderScanner`]: finds `MM-DD-YYYY` folders under the report root
//! - [`XlsxReportLoader`]: reads one service spreadsheet into a `TableSource`
//!
//! ## Expected layout
//!
//! ```text
//! <base>/
//!   11-18-2025/
//!     Patikar/
//!       EC2.xlsx
//!       RDS.xlsx
//!     Production/
//!       ...
//!   11-19-2025/
//!     ...
//!   Consolidated_Reports/      (ignored)
//! ```

pub mod discovery;
pub mod xlsx;

pub use discovery::DateFolderScanner;
pub use xlsx::XlsxReportLoader;
