//! Renderers that turn request collections into documents.
//!
//! Everything here is a pure function of its input: CSV export, a printable
//! HTML report, and the calendar month grid.

pub mod calendar;
pub mod csv;
pub mod error;
pub mod report;

pub use error::{Error, Result};

use chrono::NaiveDate;

/// `<base>_<YYYY-MM-DD>.<extension>`, the download name used for exports.
pub fn export_filename(base: &str, today: NaiveDate, extension: &str) -> String {
  format!("{base}_{}.{extension}", today.format("%Y-%m-%d"))
}
