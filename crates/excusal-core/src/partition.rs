//! Partitions: the named collections requests are stored in.
//!
//! Each partition is persisted as one JSON array under its own backend key.
//! The two review queues are also partitions; [`Queue`] names them when a
//! caller needs to act on a queue rather than read an arbitrary view.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A named, persisted collection of requests.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Partition {
  /// Full history for the student; every queued record is mirrored here.
  StudentRequests,
  /// The HOD's queue.
  PendingRequests,
  /// The faculty's queue.
  FacultyPendingRequests,
  /// Snapshots of HOD approvals, read-only reference for faculty.
  ApprovedRequests,
}

impl Partition {
  /// The backend key this partition is stored under.
  pub fn key(self) -> &'static str {
    match self {
      Self::StudentRequests => "studentRequests",
      Self::PendingRequests => "pendingRequests",
      Self::FacultyPendingRequests => "facultyPendingRequests",
      Self::ApprovedRequests => "approvedRequests",
    }
  }

  /// The queue this partition backs, if it is one.
  pub fn queue(self) -> Option<Queue> {
    match self {
      Self::PendingRequests => Some(Queue::Hod),
      Self::FacultyPendingRequests => Some(Queue::Faculty),
      Self::StudentRequests | Self::ApprovedRequests => None,
    }
  }
}

/// A reviewer's queue. Also the concrete `sentTo` value of a stored record.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Queue {
  Hod,
  Faculty,
}

impl Queue {
  pub fn partition(self) -> Partition {
    match self {
      Self::Hod => Partition::PendingRequests,
      Self::Faculty => Partition::FacultyPendingRequests,
    }
  }

  /// Suffix appended to the base id when a submission fans out to both
  /// queues.
  pub fn id_suffix(self) -> &'static str {
    match self {
      Self::Hod => "-hod",
      Self::Faculty => "-faculty",
    }
  }

  /// Human-readable reviewer title used in notifications.
  pub fn title(self) -> &'static str {
    match self {
      Self::Hod => "HOD",
      Self::Faculty => "Faculty",
    }
  }
}
