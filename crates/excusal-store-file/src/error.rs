//! Error type for `excusal-store-file`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error on {path}: {source}")]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The file parsed as JSON but is not a top-level object.
  #[error("{0} does not hold a JSON object")]
  NotAnObject(PathBuf),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
