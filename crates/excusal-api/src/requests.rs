//! Handlers that create and review requests.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/requests` | students only; returns 201 + every created record |
//! | `POST` | `/requests/{id}/review` | reviewer of the queue holding `id` |
//! | `POST` | `/queues/{queue}/bulk-review` | ids outside the queue are skipped |
//! | `POST` | `/queues/{queue}/keyword-review` | |
//! | `GET`  | `/rejection-reasons` | the fixed reason list |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use excusal_core::{
  Error,
  backend::Backend,
  partition::Queue,
  request::{Decision, NewRequest, Recipient, RejectionReason, Request},
  session::{Role, Session},
};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── Submit ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /requests`. The student name comes from the
/// authenticated session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitBody {
  pub subject: String,
  pub date:    String,
  pub reason:  String,
  pub sent_to: Recipient,
  #[serde(default)]
  pub urgent:  bool,
}

/// `POST /requests`
pub async fn submit<B>(
  State(state): State<AppState<B>>,
  Authenticated(session): Authenticated,
  Json(body): Json<SubmitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  B: Backend + Send + 'static,
{
  session.require_role(Role::Student, "submit requests")?;
  let input = NewRequest::new(session.username, body.subject, body.date, body.reason, body.sent_to)
    .urgent(body.urgent);
  let created = state.lock().submit(&input)?;
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Review ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
  pub decision:         Decision,
  pub rejection_reason: Option<RejectionReason>,
}

/// `POST /requests/{id}/review`
pub async fn review<B>(
  State(state): State<AppState<B>>,
  Authenticated(session): Authenticated,
  Path(id): Path<String>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<Request>, ApiError>
where
  B: Backend + Send + 'static,
{
  let own = session.require_queue()?;
  let mut store = state.lock();
  if store.queue_of(&id)? != own {
    return Err(other_queue(&session).into());
  }
  let updated = store.review(&id, body.decision, body.rejection_reason)?;
  Ok(Json(updated))
}

// ─── Bulk ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct BulkBody {
  pub ids:      Vec<String>,
  pub decision: Decision,
}

#[derive(Debug, Deserialize)]
pub struct KeywordBody {
  pub keyword:  String,
  pub decision: Decision,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Reviewed {
  pub reviewed: usize,
}

/// `POST /queues/{queue}/bulk-review`
pub async fn bulk_review<B>(
  State(state): State<AppState<B>>,
  Authenticated(session): Authenticated,
  Path(queue): Path<Queue>,
  Json(body): Json<BulkBody>,
) -> Result<Json<Reviewed>, ApiError>
where
  B: Backend + Send + 'static,
{
  require_owner(&session, queue)?;
  let mut store = state.lock();
  let ids: Vec<String> = body
    .ids
    .into_iter()
    .filter(|id| match store.queue_of(id) {
      Ok(owner) => owner == queue,
      Err(_) => false,
    })
    .collect();
  let reviewed = store.bulk_review(ids, body.decision);
  Ok(Json(Reviewed { reviewed }))
}

/// `POST /queues/{queue}/keyword-review`
pub async fn keyword_review<B>(
  State(state): State<AppState<B>>,
  Authenticated(session): Authenticated,
  Path(queue): Path<Queue>,
  Json(body): Json<KeywordBody>,
) -> Result<Json<Reviewed>, ApiError>
where
  B: Backend + Send + 'static,
{
  require_owner(&session, queue)?;
  let reviewed = state.lock().keyword_review(queue, &body.keyword, body.decision);
  Ok(Json(Reviewed { reviewed }))
}

/// `GET /rejection-reasons`
pub async fn rejection_reasons(
  Authenticated(_): Authenticated,
) -> Json<Vec<RejectionReason>> {
  Json(RejectionReason::iter().collect())
}

fn require_owner(session: &Session, queue: Queue) -> Result<(), Error> {
  if session.require_queue()? == queue {
    Ok(())
  } else {
    Err(other_queue(session))
  }
}

fn other_queue(session: &Session) -> Error {
  Error::Forbidden {
    role:   session.role,
    action: "review another role's queue",
  }
}
