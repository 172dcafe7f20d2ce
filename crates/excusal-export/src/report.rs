//! Printable HTML report: one table row per request.

use std::fmt::{Display, Write as _};

use chrono::{DateTime, TimeZone, Utc};
use excusal_core::request::Request;

use crate::{Error, Result, csv::format_timestamp};

const STYLE: &str = "\
body { font-family: Arial, sans-serif; padding: 20px; }
h1 { color: #8B5CF6; margin-bottom: 20px; }
table { width: 100%; border-collapse: collapse; margin-top: 20px; }
th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }
th { background-color: #8B5CF6; color: white; }
tr:nth-child(even) { background-color: #f9f9f9; }
.status-pending { color: #ca8a04; }
.status-approved { color: #16a34a; }
.status-rejected { color: #dc2626; }
.footer { margin-top: 30px; text-align: center; color: #666; font-size: 12px; }";

/// Render a self-contained HTML document listing `requests`.
///
/// `generated_at` and all request timestamps are shown in `tz`.
pub fn to_html<Tz>(
  title: &str,
  requests: &[Request],
  generated_at: DateTime<Utc>,
  tz: &Tz,
) -> Result<String>
where
  Tz: TimeZone,
  Tz::Offset: Display,
{
  if requests.is_empty() {
    return Err(Error::NothingToExport);
  }

  let title = escape(title);
  let mut rows = String::new();
  for r in requests {
    let updated = r
      .updated_at
      .map(|at| format_timestamp(at, tz))
      .unwrap_or_else(|| "N/A".to_owned());
    let reason = match r.rejection_reason {
      Some(rejection) => format!("{} <em>({})</em>", escape(&r.reason), escape(&rejection.to_string())),
      None => escape(&r.reason),
    };
    // Writing to a String cannot fail.
    let _ = write!(
      rows,
      "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
       <td class=\"status-{status}\">{status}</td><td>{}</td><td>{}</td></tr>\n",
      escape(&r.student_name),
      escape(&r.subject),
      r.date,
      reason,
      format_timestamp(r.submitted_at, tz),
      updated,
      status = r.status,
    );
  }

  Ok(format!(
    "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n\
     <style>\n{STYLE}\n</style>\n</head>\n<body>\n<h1>{title}</h1>\n\
     <p>Generated on: {generated}</p>\n<p>Total Records: {total}</p>\n\
     <table>\n<thead><tr><th>Student Name</th><th>Subject</th><th>Absence Date</th>\
     <th>Reason</th><th>Status</th><th>Submitted At</th><th>Updated At</th></tr></thead>\n\
     <tbody>\n{rows}</tbody>\n</table>\n\
     <div class=\"footer\">Attendance Exception Portal</div>\n</body>\n</html>\n",
    generated = format_timestamp(generated_at, tz),
    total = requests.len(),
  ))
}

/// Escape text for HTML element content and attribute values.
fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      other => out.push(other),
    }
  }
  out
}
