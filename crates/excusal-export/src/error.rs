//! Error types for the export renderers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no data to export")]
  NothingToExport,

  #[error("invalid month {year}-{month:02}")]
  InvalidMonth { year: i32, month: u32 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
