//! Filtering and ordering of request collections.
//!
//! Every predicate in [`RequestFilter`] is an independent conjunct, so the
//! order in which they are applied never changes the result.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::request::{Request, RequestStatus};

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::RequestStore::query`].
///
/// `None` in any field means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestFilter {
  /// Free text matched against student name, subject and reason.
  pub search:    Option<String>,
  pub status:    Option<RequestStatus>,
  /// Exact subject match.
  pub subject:   Option<String>,
  /// Inclusive lower bound on the absence date.
  pub date_from: Option<NaiveDate>,
  /// Inclusive upper bound on the absence date.
  pub date_to:   Option<NaiveDate>,
}

impl RequestFilter {
  pub fn matches(&self, request: &Request) -> bool {
    if let Some(needle) = self.needle()
      && !request.mentions(&needle)
    {
      return false;
    }
    if let Some(status) = self.status
      && request.status != status
    {
      return false;
    }
    if let Some(subject) = &self.subject
      && &request.subject != subject
    {
      return false;
    }
    if let Some(from) = self.date_from
      && request.date < from
    {
      return false;
    }
    if let Some(to) = self.date_to
      && request.date > to
    {
      return false;
    }
    true
  }

  /// Keep only the matching requests, preserving their order.
  pub fn apply(&self, requests: Vec<Request>) -> Vec<Request> {
    requests.into_iter().filter(|r| self.matches(r)).collect()
  }

  /// How many criteria are set. A blank search does not count.
  pub fn active_count(&self) -> usize {
    [
      self.needle().is_some(),
      self.status.is_some(),
      self.subject.is_some(),
      self.date_from.is_some(),
      self.date_to.is_some(),
    ]
    .into_iter()
    .filter(|active| *active)
    .count()
  }

  fn needle(&self) -> Option<String> {
    self
      .search
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_lowercase)
  }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// Sort urgent requests first, then most recently submitted first.
///
/// The sort is stable, so requests that compare equal keep their insertion
/// order.
pub fn sort_requests(requests: &mut [Request]) {
  requests.sort_by(|a, b| {
    b.urgent
      .cmp(&a.urgent)
      .then_with(|| b.submitted_at.cmp(&a.submitted_at))
  });
}

/// Sort most recently decided first, falling back to `submitted_at` for
/// records never reviewed. Stable.
pub fn sort_by_decision(requests: &mut [Request]) {
  requests.sort_by(|a, b| b.decided_at().cmp(&a.decided_at()));
}

/// Distinct subjects in the collection, alphabetically.
pub fn subjects(requests: &[Request]) -> Vec<String> {
  requests
    .iter()
    .map(|r| r.subject.clone())
    .collect::<BTreeSet<_>>()
    .into_iter()
    .collect()
}
