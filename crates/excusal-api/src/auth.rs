//! HTTP Basic-auth extractor.
//!
//! Credentials are checked against the portal's account table; the resulting
//! [`Session`] decides which partitions and queues the caller may touch.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use excusal_core::{Error, session::Session};

use crate::error::ApiError;

/// The authenticated caller.
pub struct Authenticated(pub Session);

/// Resolve the `Authorization: Basic ...` header into a session.
pub fn verify_auth(headers: &HeaderMap) -> Result<Session, ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::InvalidCredentials)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::InvalidCredentials)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::InvalidCredentials)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| Error::InvalidCredentials)?;

  let (username, password) = creds.split_once(':').ok_or(Error::InvalidCredentials)?;

  Ok(Session::authenticate(username, password)?)
}

impl<S> FromRequestParts<S> for Authenticated
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers).map(Authenticated)
  }
}
