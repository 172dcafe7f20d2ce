//! [`RequestStore`]: CRUD and routing rules across the request partitions.
//!
//! Every operation is a synchronous read-modify-write against the backend:
//! partitions are read in full, changed in memory and written back in one
//! [`Backend::put_many`] batch per state transition.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Error, Result,
  backend::Backend,
  notify::{Discard, NewNotification, NotificationKind, NotificationSink},
  partition::{Partition, Queue},
  query::{self, RequestFilter},
  request::{Decision, NewRequest, RejectionReason, Recipient, Request, RequestStatus},
  stats::Statistics,
};

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of `submitted_at` / `updated_at` timestamps.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The single owner of the request partitions.
///
/// Keeps `studentRequests` a mirror of both queues and copies HOD approvals
/// into `approvedRequests`. Nothing else should write those keys.
pub struct RequestStore<B, N = Discard> {
  backend:  B,
  notifier: N,
  clock:    Box<dyn Clock>,
}

impl<B: Backend> RequestStore<B> {
  /// A store whose notifications go nowhere.
  pub fn without_notifications(backend: B) -> Self { Self::new(backend, Discard) }
}

impl<B: Backend, N: NotificationSink> RequestStore<B, N> {
  pub fn new(backend: B, notifier: N) -> Self {
    Self {
      backend,
      notifier,
      clock: Box::new(SystemClock),
    }
  }

  /// Replace the clock, e.g. with a fixed one in tests.
  pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
    self.clock = Box::new(clock);
    self
  }

  pub fn backend(&self) -> &B { &self.backend }

  pub fn backend_mut(&mut self) -> &mut B { &mut self.backend }

  pub fn notifier(&self) -> &N { &self.notifier }

  pub fn notifier_mut(&mut self) -> &mut N { &mut self.notifier }

  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  // ── Reads ───────────────────────────────────────────────────────────────

  /// The partition in display order. Queues and history are urgent first,
  /// then newest first; `approvedRequests` is most recently decided first.
  pub fn load(&self, partition: Partition) -> Vec<Request> {
    let mut requests = self.load_raw(partition);
    match partition {
      Partition::ApprovedRequests => query::sort_by_decision(&mut requests),
      _ => query::sort_requests(&mut requests),
    }
    requests
  }

  /// Matching requests of `partition`, in display order.
  pub fn query(&self, partition: Partition, filter: &RequestFilter) -> Vec<Request> {
    filter.apply(self.load(partition))
  }

  /// The actionable subset of a queue.
  pub fn pending(&self, queue: Queue) -> Vec<Request> {
    let filter = RequestFilter {
      status: Some(RequestStatus::Pending),
      ..Default::default()
    };
    self.query(queue.partition(), &filter)
  }

  /// Distinct subjects of `partition`, for populating a subject filter.
  pub fn subjects(&self, partition: Partition) -> Vec<String> {
    query::subjects(&self.load_raw(partition))
  }

  pub fn statistics<Tz: TimeZone>(
    &self,
    partition: Partition,
    now: &DateTime<Tz>,
  ) -> Statistics {
    Statistics::compute(&self.load_raw(partition), now)
  }

  /// The queue that owns `id`.
  pub fn queue_of(&self, id: &str) -> Result<Queue> {
    self
      .locate(id)
      .map(|(queue, _, _)| queue)
      .ok_or_else(|| Error::NotFound(id.to_owned()))
  }

  // ── Submission ──────────────────────────────────────────────────────────

  /// Create one pending record per target queue.
  ///
  /// A `both` submission fans out into `<id>-hod` and `<id>-faculty`, which
  /// share every other field. All created records are returned in queue
  /// order.
  pub fn submit(&mut self, input: &NewRequest) -> Result<Vec<Request>> {
    let valid = input.validate()?;
    let now = self.clock.now();
    let base_id = Uuid::now_v7().to_string();
    let queues = valid.sent_to.queues();

    let created: Vec<Request> = queues
      .iter()
      .map(|&queue| Request {
        id:               if queues.len() > 1 {
          format!("{base_id}{}", queue.id_suffix())
        } else {
          base_id.clone()
        },
        student_name:     valid.student_name.clone(),
        subject:          valid.subject.clone(),
        date:             valid.date,
        reason:           valid.reason.clone(),
        status:           RequestStatus::Pending,
        sent_to:          queue,
        submitted_at:     now,
        updated_at:       None,
        urgent:           valid.urgent,
        rejection_reason: None,
      })
      .collect();

    let mut student = self.load_raw(Partition::StudentRequests);
    student.extend(created.iter().cloned());
    let mut writes = vec![(Partition::StudentRequests, student)];

    for request in &created {
      let partition = request.sent_to.partition();
      let mut queue = self.load_raw(partition);
      queue.push(request.clone());
      writes.push((partition, queue));
    }

    self.write(writes)?;

    tracing::info!(
      ids = ?created.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
      student = %valid.student_name,
      sent_to = %valid.sent_to,
      urgent = valid.urgent,
      "request submitted"
    );

    let prefix = if valid.urgent { "URGENT: " } else { "" };
    let targets = match valid.sent_to {
      Recipient::Hod => "HOD",
      Recipient::Faculty => "Faculty",
      Recipient::Both => "HOD and Faculty",
    };
    self.emit(NewNotification {
      message:            format!(
        "{prefix}New request from {} for {} on {}, sent to {targets}",
        valid.student_name, valid.subject, valid.date
      ),
      kind:               if valid.urgent {
        NotificationKind::Warning
      } else {
        NotificationKind::Info
      },
      related_request_id: created.first().map(|r| r.id.clone()),
      timestamp:          now,
    });

    Ok(created)
  }

  // ── Review ──────────────────────────────────────────────────────────────

  /// Move a pending record to `decision`.
  ///
  /// Updates the owning queue and the mirrored `studentRequests` record in
  /// one batch. Only HOD approvals are copied into `approvedRequests`;
  /// faculty approvals are not.
  pub fn review(
    &mut self,
    id: &str,
    decision: Decision,
    rejection_reason: Option<RejectionReason>,
  ) -> Result<Request> {
    let (queue, mut records, index) =
      self.locate(id).ok_or_else(|| Error::NotFound(id.to_owned()))?;

    let record = &mut records[index];
    if !record.status.is_pending() {
      return Err(Error::InvalidState {
        id:     id.to_owned(),
        status: record.status,
      });
    }

    let now = self.clock.now();
    record.status = decision.status();
    record.updated_at = Some(now);
    record.rejection_reason = match decision {
      Decision::Rejected => rejection_reason,
      Decision::Approved => None,
    };
    let updated = record.clone();

    let mut student = self.load_raw(Partition::StudentRequests);
    match student.iter_mut().find(|r| r.id == id) {
      Some(mirror) => *mirror = updated.clone(),
      None => {
        tracing::warn!(id, "queued request had no student mirror, restoring it");
        student.push(updated.clone());
      }
    }

    let mut writes = vec![
      (queue.partition(), records),
      (Partition::StudentRequests, student),
    ];

    if queue == Queue::Hod && decision == Decision::Approved {
      let mut approved = self.load_raw(Partition::ApprovedRequests);
      approved.push(updated.clone());
      writes.push((Partition::ApprovedRequests, approved));
    }

    self.write(writes)?;

    tracing::info!(id, queue = %queue, status = %updated.status, "request reviewed");

    let verb = decision.status();
    let mut message = format!(
      "{} {verb} {}'s request for {} on {}",
      queue.title(),
      updated.student_name,
      updated.subject,
      updated.date
    );
    if let Some(reason) = updated.rejection_reason {
      message.push_str(&format!(": {reason}"));
    }
    self.emit(NewNotification {
      message,
      kind: match decision {
        Decision::Approved => NotificationKind::Success,
        Decision::Rejected => NotificationKind::Error,
      },
      related_request_id: Some(updated.id.clone()),
      timestamp: now,
    });

    Ok(updated)
  }

  /// Review every id independently. Failures are logged and skipped; the
  /// return value counts successful transitions only.
  pub fn bulk_review<I, S>(&mut self, ids: I, decision: Decision) -> usize
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut reviewed = 0;
    for id in ids {
      let id = id.as_ref();
      match self.review(id, decision, None) {
        Ok(_) => reviewed += 1,
        Err(err) => tracing::debug!(id, error = %err, "skipping request in bulk review"),
      }
    }
    reviewed
  }

  /// Bulk-review the pending records of `queue` whose student name, subject
  /// or reason contains `keyword` (case-insensitive). A blank keyword is a
  /// no-op.
  pub fn keyword_review(&mut self, queue: Queue, keyword: &str, decision: Decision) -> usize {
    let keyword = keyword.trim();
    if keyword.is_empty() {
      return 0;
    }
    let needle = keyword.to_lowercase();
    let ids: Vec<String> = self
      .pending(queue)
      .into_iter()
      .filter(|r| r.mentions(&needle))
      .map(|r| r.id)
      .collect();
    self.bulk_review(ids, decision)
  }

  // ── Internals ───────────────────────────────────────────────────────────

  /// Partition contents in insertion order. Absent or unreadable partitions
  /// read as empty.
  fn load_raw(&self, partition: Partition) -> Vec<Request> {
    let value = match self.backend.get(partition.key()) {
      Ok(Some(value)) => value,
      Ok(None) => return Vec::new(),
      Err(err) => {
        tracing::warn!(%partition, error = %err, "partition unreadable, treating as empty");
        return Vec::new();
      }
    };
    serde_json::from_value(value).unwrap_or_else(|err| {
      tracing::warn!(%partition, error = %err, "partition corrupt, treating as empty");
      Vec::new()
    })
  }

  /// Find `id` in the review queues: the owning queue, its full contents and
  /// the record's index.
  fn locate(&self, id: &str) -> Option<(Queue, Vec<Request>, usize)> {
    [Queue::Hod, Queue::Faculty].into_iter().find_map(|queue| {
      let records = self.load_raw(queue.partition());
      let index = records.iter().position(|r| r.id == id)?;
      Some((queue, records, index))
    })
  }

  fn write(&mut self, writes: Vec<(Partition, Vec<Request>)>) -> Result<()> {
    let entries = writes
      .into_iter()
      .map(|(partition, requests)| -> Result<(String, Value)> {
        Ok((partition.key().to_owned(), serde_json::to_value(requests)?))
      })
      .collect::<Result<Vec<(String, Value)>>>()?;
    self.backend.put_many(entries).map_err(Error::storage)
  }

  fn emit(&mut self, notification: NewNotification) {
    if let Err(err) = self.notifier.notify(notification) {
      tracing::warn!(error = %err, "notification sink failed");
    }
  }
}
