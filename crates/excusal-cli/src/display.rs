//! Plain-text rendering for terminal output.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use excusal_core::{
  notify::Notification,
  partition::Partition,
  request::Request,
  stats::{PendingSince, Statistics, is_stale},
};

/// One line per request; pending rows show how long they have waited.
pub fn request_table(requests: &[Request], now: DateTime<Utc>) -> String {
  if requests.is_empty() {
    return "No requests.\n".to_owned();
  }

  let mut out = format!(
    "{:<40} {:<10} {:<16} {:<12} {:<9} {}\n",
    "ID", "DATE", "SUBJECT", "STUDENT", "STATUS", "NOTE"
  );
  for r in requests {
    let mut note = Vec::new();
    if r.urgent {
      note.push("URGENT".to_owned());
    }
    if r.status.is_pending() {
      note.push(format!("waiting {}", PendingSince::of(r, now)));
      if is_stale(r, now) {
        note.push("STALE".to_owned());
      }
    }
    if let Some(reason) = r.rejection_reason {
      note.push(reason.to_string());
    }
    let _ = writeln!(
      out,
      "{:<40} {:<10} {:<16} {:<12} {:<9} {}",
      r.id,
      r.date,
      truncate(&r.subject, 16),
      truncate(&r.student_name, 12),
      r.status,
      note.join(", ")
    );
  }
  out
}

pub fn statistics(stats: &Statistics) -> String {
  format!(
    "Total:            {}\n\
     Pending:          {}\n\
     Approved:         {}\n\
     Rejected:         {}\n\
     Approval rate:    {}%\n\
     Avg response:     {}\n\
     Today's workload: {}\n\
     Stale (5+ days):  {}\n",
    stats.total,
    stats.pending,
    stats.approved,
    stats.rejected,
    stats.approval_rate,
    stats.avg_response_label(),
    stats.todays_workload,
    stats.stale,
  )
}

pub fn notifications(list: &[Notification]) -> String {
  if list.is_empty() {
    return "No notifications.\n".to_owned();
  }
  let unread = list.iter().filter(|n| !n.read).count();
  let mut out = format!("{} notifications, {unread} unread\n", list.len());
  for n in list {
    let marker = if n.read { ' ' } else { '*' };
    let _ = writeln!(
      out,
      "{marker} {} [{}] {} ({})",
      n.timestamp.format("%Y-%m-%d %H:%M"),
      n.kind,
      n.message,
      n.id
    );
  }
  out
}

/// Heading used for exported documents.
pub fn report_title(partition: Partition) -> &'static str {
  match partition {
    Partition::StudentRequests => "My Attendance Requests",
    Partition::PendingRequests => "HOD Attendance Requests",
    Partition::FacultyPendingRequests => "Faculty Attendance Requests",
    Partition::ApprovedRequests => "HOD-Approved Requests",
  }
}

fn truncate(s: &str, width: usize) -> String {
  if s.chars().count() <= width {
    s.to_owned()
  } else {
    let mut cut: String = s.chars().take(width - 1).collect();
    cut.push('~');
    cut
  }
}
