//! Request types, the single entity of the Excusal portal.
//!
//! A request is created by a student submission, queued for one reviewer, and
//! moves forward exactly once from `pending` to `approved` or `rejected`.
//! Records are never deleted; a review mutates `status`, `updated_at` and
//! `rejection_reason` in place.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::{Error, Result, partition::Queue};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a request stands in its review cycle.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RequestStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
}

impl RequestStatus {
  pub fn is_pending(&self) -> bool { matches!(self, Self::Pending) }
}

/// The outcome a reviewer chooses.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Decision {
  #[strum(to_string = "approved", serialize = "approve")]
  Approved,
  #[strum(to_string = "rejected", serialize = "reject")]
  Rejected,
}

impl Decision {
  /// The terminal status this decision moves a request into.
  pub fn status(self) -> RequestStatus {
    match self {
      Self::Approved => RequestStatus::Approved,
      Self::Rejected => RequestStatus::Rejected,
    }
  }
}

/// The fixed set of reasons a reviewer may attach to a rejection.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum RejectionReason {
  #[serde(rename = "Insufficient documentation")]
  #[strum(serialize = "Insufficient documentation")]
  InsufficientDocumentation,
  #[serde(rename = "Invalid date")]
  #[strum(serialize = "Invalid date")]
  InvalidDate,
  #[serde(rename = "Reason not acceptable")]
  #[strum(serialize = "Reason not acceptable")]
  ReasonNotAcceptable,
  #[serde(rename = "Duplicate request")]
  #[strum(serialize = "Duplicate request")]
  DuplicateRequest,
  #[serde(rename = "Attendance already marked")]
  #[strum(serialize = "Attendance already marked")]
  AttendanceAlreadyMarked,
  #[serde(rename = "Other")]
  #[strum(serialize = "Other")]
  Other,
}

// ─── Routing ─────────────────────────────────────────────────────────────────

/// The routing target chosen at submission time.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Recipient {
  Hod,
  Faculty,
  Both,
}

impl Recipient {
  /// The queues a submission fans out into, in creation order.
  pub fn queues(self) -> &'static [Queue] {
    match self {
      Self::Hod => &[Queue::Hod],
      Self::Faculty => &[Queue::Faculty],
      Self::Both => &[Queue::Hod, Queue::Faculty],
    }
  }
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// A stored attendance-exception request.
///
/// Field names serialise in camelCase, matching the persisted blob layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
  pub id:               String,
  pub student_name:     String,
  pub subject:          String,
  /// The absence date.
  pub date:             NaiveDate,
  pub reason:           String,
  #[serde(default)]
  pub status:           RequestStatus,
  /// The concrete queue this record was routed to.
  pub sent_to:          Queue,
  /// Set once at submission; never changes.
  pub submitted_at:     DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at:       Option<DateTime<Utc>>,
  #[serde(default)]
  pub urgent:           bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rejection_reason: Option<RejectionReason>,
}

impl Request {
  /// Case-insensitive substring match over student name, subject and reason.
  ///
  /// `needle` must already be lowercased.
  pub fn mentions(&self, needle: &str) -> bool {
    self.student_name.to_lowercase().contains(needle)
      || self.subject.to_lowercase().contains(needle)
      || self.reason.to_lowercase().contains(needle)
  }

  /// When the record last changed state.
  pub fn decided_at(&self) -> DateTime<Utc> { self.updated_at.unwrap_or(self.submitted_at) }
}

// ─── NewRequest ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::RequestStore::submit`].
///
/// Text fields arrive unvalidated; `validate` trims them and parses the date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRequest {
  #[serde(default)]
  pub student_name: String,
  pub subject:      String,
  pub date:         String,
  pub reason:       String,
  pub sent_to:      Recipient,
  #[serde(default)]
  pub urgent:       bool,
}

/// A submission whose fields have passed validation.
#[derive(Debug, Clone)]
pub(crate) struct ValidRequest {
  pub student_name: String,
  pub subject:      String,
  pub date:         NaiveDate,
  pub reason:       String,
  pub sent_to:      Recipient,
  pub urgent:       bool,
}

impl NewRequest {
  pub fn new(
    student_name: impl Into<String>,
    subject: impl Into<String>,
    date: impl Into<String>,
    reason: impl Into<String>,
    sent_to: Recipient,
  ) -> Self {
    Self {
      student_name: student_name.into(),
      subject: subject.into(),
      date: date.into(),
      reason: reason.into(),
      sent_to,
      urgent: false,
    }
  }

  pub fn urgent(mut self, urgent: bool) -> Self {
    self.urgent = urgent;
    self
  }

  pub(crate) fn validate(&self) -> Result<ValidRequest> {
    let student_name = required("student name", &self.student_name)?;
    let subject = required("subject", &self.subject)?;
    let date_str = required("date", &self.date)?;
    let reason = required("reason", &self.reason)?;

    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|_| {
      Error::Validation(format!("date {date_str:?} is not a YYYY-MM-DD date"))
    })?;

    Ok(ValidRequest {
      student_name,
      subject,
      date,
      reason,
      sent_to: self.sent_to,
      urgent: self.urgent,
    })
  }
}

fn required(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("{field} is required")));
  }
  Ok(trimmed.to_owned())
}
