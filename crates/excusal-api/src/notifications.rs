//! Handlers for the notification log.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use excusal_core::{backend::Backend, notify::Notification};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::Authenticated, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
  pub notifications: Vec<Notification>,
  pub unread_count:  usize,
}

/// `GET /notifications`, newest first.
pub async fn list<B>(
  State(state): State<AppState<B>>,
  Authenticated(_): Authenticated,
) -> Json<NotificationList>
where
  B: Backend + Send + 'static,
{
  let store = state.lock();
  let log = store.notifier();
  Json(NotificationList {
    notifications: log.list(),
    unread_count:  log.unread_count(),
  })
}

/// `POST /notifications/{id}/read`
pub async fn read_one<B>(
  State(state): State<AppState<B>>,
  Authenticated(_): Authenticated,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  B: Backend + Send + 'static,
{
  if state.lock().notifier_mut().mark_read(&id)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound(format!("notification {id}")))
  }
}

/// `POST /notifications/read-all`
pub async fn read_all<B>(
  State(state): State<AppState<B>>,
  Authenticated(_): Authenticated,
) -> Result<StatusCode, ApiError>
where
  B: Backend + Send + 'static,
{
  state.lock().notifier_mut().mark_all_read()?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /notifications`
pub async fn clear<B>(
  State(state): State<AppState<B>>,
  Authenticated(_): Authenticated,
) -> Result<StatusCode, ApiError>
where
  B: Backend + Send + 'static,
{
  state.lock().notifier_mut().clear()?;
  Ok(StatusCode::NO_CONTENT)
}
