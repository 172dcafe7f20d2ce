//! Error types for `excusal-core`.

use thiserror::Error;

use crate::{request::RequestStatus, session::Role};

#[derive(Debug, Error)]
pub enum Error {
  /// A required submission field was missing or malformed.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("request not found: {0}")]
  NotFound(String),

  #[error("request {id} is already {status}")]
  InvalidState { id: String, status: RequestStatus },

  #[error("invalid username or password")]
  InvalidCredentials,

  #[error("role {role} may not {action}")]
  Forbidden { role: Role, action: &'static str },

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn storage<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
