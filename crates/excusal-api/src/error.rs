//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] excusal_core::Error),

  #[error(transparent)]
  Export(#[from] excusal_export::Error),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("not found: {0}")]
  NotFound(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    use excusal_core::Error as Core;

    match self {
      ApiError::Core(e) => match e {
        Core::Validation(_) => StatusCode::BAD_REQUEST,
        Core::NotFound(_) => StatusCode::NOT_FOUND,
        Core::InvalidState { .. } => StatusCode::CONFLICT,
        Core::InvalidCredentials => StatusCode::UNAUTHORIZED,
        Core::Forbidden { .. } => StatusCode::FORBIDDEN,
        Core::Storage(_) | Core::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::Export(e) => match e {
        excusal_export::Error::NothingToExport => StatusCode::NOT_FOUND,
        excusal_export::Error::InvalidMonth { .. } => StatusCode::BAD_REQUEST,
      },
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"excusal\""),
      );
    }
    res
  }
}
