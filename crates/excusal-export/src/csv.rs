//! CSV export.
//!
//! Free-text fields are always quoted; embedded quotes are doubled. Dates and
//! enum fields are written bare.

use std::fmt::Display;

use chrono::{DateTime, TimeZone, Utc};
use excusal_core::request::Request;

use crate::{Error, Result};

pub const HEADERS: [&str; 7] = [
  "Student Name",
  "Subject",
  "Absence Date",
  "Reason",
  "Status",
  "Submitted At",
  "Updated At",
];

/// Timestamp layout used for the submitted/updated columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render `requests` as CSV, formatting timestamps in `tz`.
pub fn to_csv<Tz>(requests: &[Request], tz: &Tz) -> Result<String>
where
  Tz: TimeZone,
  Tz::Offset: Display,
{
  if requests.is_empty() {
    return Err(Error::NothingToExport);
  }

  let mut lines = Vec::with_capacity(requests.len() + 1);
  lines.push(HEADERS.join(","));

  for r in requests {
    let fields = [
      quote(&r.student_name),
      quote(&r.subject),
      r.date.to_string(),
      quote(&r.reason),
      r.status.to_string(),
      format_timestamp(r.submitted_at, tz),
      r.updated_at
        .map(|at| format_timestamp(at, tz))
        .unwrap_or_else(|| "N/A".to_owned()),
    ];
    lines.push(fields.join(","));
  }

  Ok(lines.join("\n"))
}

pub(crate) fn format_timestamp<Tz>(at: DateTime<Utc>, tz: &Tz) -> String
where
  Tz: TimeZone,
  Tz::Offset: Display,
{
  at.with_timezone(tz).format(TIMESTAMP_FORMAT).to_string()
}

fn quote(s: &str) -> String { format!("\"{}\"", s.replace('"', "\"\"")) }
