//! Derived statistics over a request collection. Never stored.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::request::{Request, RequestStatus};

/// A pending request becomes stale after this many days.
pub const STALE_AFTER_DAYS: i64 = 5;

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Dashboard figures for one collection as seen at a given moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
  pub total:              usize,
  pub pending:            usize,
  pub approved:           usize,
  pub rejected:           usize,
  /// Whole-number percentage of approved requests.
  pub approval_rate:      u32,
  /// Mean review turnaround in hours; `None` when nothing was reviewed.
  pub avg_response_hours: Option<i64>,
  /// Requests submitted on the viewer's current local day.
  pub todays_workload:    usize,
  pub stale:              usize,
}

impl Statistics {
  /// Compute statistics at `now`. The timezone of `now` decides which
  /// calendar day counts as "today".
  pub fn compute<Tz: TimeZone>(requests: &[Request], now: &DateTime<Tz>) -> Self {
    let count = |status| requests.iter().filter(|r| r.status == status).count();
    let approved = count(RequestStatus::Approved);
    let today = now.date_naive();
    let now_utc = now.with_timezone(&Utc);

    Self {
      total: requests.len(),
      pending: count(RequestStatus::Pending),
      approved,
      rejected: count(RequestStatus::Rejected),
      approval_rate: approval_rate(approved, requests.len()),
      avg_response_hours: average_response_hours(requests),
      todays_workload: requests
        .iter()
        .filter(|r| r.submitted_at.with_timezone(&now.timezone()).date_naive() == today)
        .count(),
      stale: requests.iter().filter(|r| is_stale(r, now_utc)).count(),
    }
  }

  /// The average response time as displayed, e.g. `"5h"` or `"No data"`.
  pub fn avg_response_label(&self) -> String {
    match self.avg_response_hours {
      Some(hours) => format!("{hours}h"),
      None => "No data".to_owned(),
    }
  }
}

/// `round(approved / total × 100)`, or 0 for an empty collection.
pub fn approval_rate(approved: usize, total: usize) -> u32 {
  if total == 0 {
    return 0;
  }
  (approved as f64 / total as f64 * 100.0).round() as u32
}

/// Mean of `updated_at − submitted_at` over reviewed requests, in rounded
/// hours.
pub fn average_response_hours(requests: &[Request]) -> Option<i64> {
  let turnarounds: Vec<Duration> = requests
    .iter()
    .filter(|r| !r.status.is_pending())
    .filter_map(|r| r.updated_at.map(|at| at - r.submitted_at))
    .collect();

  if turnarounds.is_empty() {
    return None;
  }

  let total_secs: i64 = turnarounds.iter().map(Duration::num_seconds).sum();
  let mean_hours = total_secs as f64 / turnarounds.len() as f64 / 3600.0;
  Some(mean_hours.round() as i64)
}

// ─── Per-request ─────────────────────────────────────────────────────────────

/// Elapsed time since submission, bucketed for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "camelCase")]
pub enum PendingSince {
  Days(i64),
  Hours(i64),
  JustNow,
}

impl PendingSince {
  pub fn of(request: &Request, now: DateTime<Utc>) -> Self {
    Self::from_elapsed(now - request.submitted_at)
  }

  pub fn from_elapsed(elapsed: Duration) -> Self {
    if elapsed.num_days() >= 1 {
      Self::Days(elapsed.num_days())
    } else if elapsed.num_hours() >= 1 {
      Self::Hours(elapsed.num_hours())
    } else {
      Self::JustNow
    }
  }
}

impl fmt::Display for PendingSince {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Days(1) => f.write_str("1 day"),
      Self::Days(n) => write!(f, "{n} days"),
      Self::Hours(1) => f.write_str("1 hour"),
      Self::Hours(n) => write!(f, "{n} hours"),
      Self::JustNow => f.write_str("Just now"),
    }
  }
}

/// A request is stale when it has been pending for at least
/// [`STALE_AFTER_DAYS`] days.
pub fn is_stale(request: &Request, now: DateTime<Utc>) -> bool {
  request.status.is_pending()
    && now - request.submitted_at >= Duration::days(STALE_AFTER_DAYS)
}
