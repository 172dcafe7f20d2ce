//! Read-only handlers over a partition.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/partitions/{partition}` | optional `search`, `status`, `subject`, `dateFrom`, `dateTo` |
//! | `GET`  | `/partitions/{partition}/subjects` | distinct subjects, sorted |
//! | `GET`  | `/partitions/{partition}/stats` | dashboard figures |
//! | `GET`  | `/partitions/{partition}/export.csv` | CSV attachment, same filters as the list |
//!
//! `status` and `subject` accept `all` for "no filter".

use axum::{
  Json,
  extract::{Path, Query, State},
  http::header,
  response::IntoResponse,
};
use chrono::{Local, NaiveDate};
use excusal_core::{
  backend::Backend,
  partition::Partition,
  query::RequestFilter,
  request::{Request, RequestStatus},
  stats::Statistics,
};
use serde::Deserialize;

use crate::{AppState, auth::Authenticated, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub search:    Option<String>,
  pub status:    Option<String>,
  pub subject:   Option<String>,
  pub date_from: Option<String>,
  pub date_to:   Option<String>,
}

impl TryFrom<ListParams> for RequestFilter {
  type Error = ApiError;

  fn try_from(p: ListParams) -> Result<Self, Self::Error> {
    let status = match unless_all(p.status) {
      Some(s) => Some(
        s.parse::<RequestStatus>()
          .map_err(|_| ApiError::BadRequest(format!("unknown status {s:?}")))?,
      ),
      None => None,
    };

    Ok(RequestFilter {
      search: p.search,
      status,
      subject: unless_all(p.subject),
      date_from: parse_date("dateFrom", p.date_from)?,
      date_to: parse_date("dateTo", p.date_to)?,
    })
  }
}

fn unless_all(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn parse_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, ApiError> {
  match value.filter(|v| !v.is_empty()) {
    Some(v) => NaiveDate::parse_from_str(&v, "%Y-%m-%d")
      .map(Some)
      .map_err(|_| ApiError::BadRequest(format!("{field} must be YYYY-MM-DD, got {v:?}"))),
    None => Ok(None),
  }
}

/// `GET /partitions/{partition}`: filtered, in display order.
pub async fn list<B>(
  State(state): State<AppState<B>>,
  Authenticated(session): Authenticated,
  Path(partition): Path<Partition>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Request>>, ApiError>
where
  B: Backend + Send + 'static,
{
  session.require_read(partition)?;
  let filter = RequestFilter::try_from(params)?;
  let store = state.lock();
  Ok(Json(store.query(partition, &filter)))
}

/// `GET /partitions/{partition}/subjects`
pub async fn subjects<B>(
  State(state): State<AppState<B>>,
  Authenticated(session): Authenticated,
  Path(partition): Path<Partition>,
) -> Result<Json<Vec<String>>, ApiError>
where
  B: Backend + Send + 'static,
{
  session.require_read(partition)?;
  Ok(Json(state.lock().subjects(partition)))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

/// `GET /partitions/{partition}/stats`. "Today" is the server's local day.
pub async fn stats<B>(
  State(state): State<AppState<B>>,
  Authenticated(session): Authenticated,
  Path(partition): Path<Partition>,
) -> Result<Json<Statistics>, ApiError>
where
  B: Backend + Send + 'static,
{
  session.require_read(partition)?;
  let store = state.lock();
  let now = store.now().with_timezone(&Local);
  Ok(Json(store.statistics(partition, &now)))
}

// ─── Export ───────────────────────────────────────────────────────────────────

/// `GET /partitions/{partition}/export.csv`: the filtered view as CSV.
pub async fn export_csv<B>(
  State(state): State<AppState<B>>,
  Authenticated(session): Authenticated,
  Path(partition): Path<Partition>,
  Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  B: Backend + Send + 'static,
{
  session.require_read(partition)?;
  let filter = RequestFilter::try_from(params)?;
  let store = state.lock();
  let today = store.now().with_timezone(&Local).date_naive();
  let body = excusal_export::csv::to_csv(&store.query(partition, &filter), &Local)?;
  let filename = excusal_export::export_filename(partition.key(), today, "csv");

  Ok((
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
    ],
    body,
  ))
}
