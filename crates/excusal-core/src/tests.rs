//! Integration tests for `RequestStore` against an in-memory backend.

use std::sync::{
  Arc,
  atomic::{AtomicI64, Ordering},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

use crate::{
  Error, RequestStore,
  backend::{Backend, MemoryBackend},
  notify::{NewNotification, NotificationKind, NotificationLog, NotificationSink},
  partition::{Partition, Queue},
  query::RequestFilter,
  request::{Decision, NewRequest, Recipient, RejectionReason, RequestStatus},
  store::Clock,
};

/// A clock the test can move forward.
#[derive(Clone)]
struct TestClock(Arc<AtomicI64>);

impl TestClock {
  fn start() -> Self {
    let t0 = Utc.with_ymd_and_hms(2024, 3, 9, 9, 0, 0).unwrap();
    Self(Arc::new(AtomicI64::new(t0.timestamp())))
  }

  fn advance(&self, by: Duration) { self.0.fetch_add(by.num_seconds(), Ordering::SeqCst); }
}

impl Clock for TestClock {
  fn now(&self) -> DateTime<Utc> {
    Utc.timestamp_opt(self.0.load(Ordering::SeqCst), 0).unwrap()
  }
}

type Store = RequestStore<MemoryBackend, NotificationLog<MemoryBackend>>;

fn store() -> (Store, TestClock) {
  let clock = TestClock::start();
  let store = RequestStore::new(
    MemoryBackend::new(),
    NotificationLog::new(MemoryBackend::new()),
  )
  .with_clock(clock.clone());
  (store, clock)
}

fn math(sent_to: Recipient) -> NewRequest {
  NewRequest::new("student1", "Math", "2024-03-10", "sick", sent_to)
}

fn ids(store: &Store, partition: Partition) -> Vec<String> {
  store.load(partition).into_iter().map(|r| r.id).collect()
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[test]
fn submit_to_hod_lands_in_hod_queue_and_history() {
  let (mut s, _) = store();
  let created = s.submit(&math(Recipient::Hod)).unwrap();
  assert_eq!(created.len(), 1);
  let id = &created[0].id;

  assert_eq!(ids(&s, Partition::PendingRequests), [id.clone()]);
  assert_eq!(ids(&s, Partition::StudentRequests), [id.clone()]);
  assert!(s.load(Partition::FacultyPendingRequests).is_empty());
  assert!(s.load(Partition::ApprovedRequests).is_empty());
  assert_eq!(created[0].status, RequestStatus::Pending);
  assert_eq!(created[0].sent_to, Queue::Hod);
}

#[test]
fn submit_both_fans_out_into_two_records() {
  let (mut s, _) = store();
  let created = s.submit(&math(Recipient::Both).urgent(true)).unwrap();
  assert_eq!(created.len(), 2);

  let (hod, faculty) = (&created[0], &created[1]);
  assert_ne!(hod.id, faculty.id);
  assert!(hod.id.ends_with("-hod"));
  assert!(faculty.id.ends_with("-faculty"));
  assert_eq!(hod.id.trim_end_matches("-hod"), faculty.id.trim_end_matches("-faculty"));

  for field_pair in [
    (&hod.subject, &faculty.subject),
    (&hod.reason, &faculty.reason),
    (&hod.student_name, &faculty.student_name),
  ] {
    assert_eq!(field_pair.0, field_pair.1);
  }
  assert_eq!(hod.date, faculty.date);
  assert_eq!(hod.urgent, faculty.urgent);
  assert_eq!(hod.submitted_at, faculty.submitted_at);

  assert_eq!(s.load(Partition::StudentRequests).len(), 2);
  assert_eq!(ids(&s, Partition::PendingRequests), [hod.id.clone()]);
  assert_eq!(ids(&s, Partition::FacultyPendingRequests), [faculty.id.clone()]);
}

#[test]
fn submit_rejects_blank_fields_without_writing() {
  let (mut s, _) = store();
  let input = NewRequest::new("student1", "Math", "2024-03-10", "   ", Recipient::Hod);
  assert!(matches!(s.submit(&input), Err(Error::Validation(_))));
  assert!(s.backend().keys().next().is_none());
  assert!(s.notifier().list().is_empty());
}

#[test]
fn submit_emits_one_notification_with_urgency_prefix() {
  let (mut s, _) = store();
  s.submit(&math(Recipient::Both).urgent(true)).unwrap();

  let notes = s.notifier().list();
  assert_eq!(notes.len(), 1);
  assert!(notes[0].message.starts_with("URGENT: "));
  assert_eq!(notes[0].kind, NotificationKind::Warning);

  s.submit(&math(Recipient::Faculty)).unwrap();
  let notes = s.notifier().list();
  assert_eq!(notes.len(), 2);
  assert!(!notes[0].message.starts_with("URGENT"));
  assert_eq!(notes[0].kind, NotificationKind::Info);
}

// ─── Review ──────────────────────────────────────────────────────────────────

#[test]
fn hod_rejection_scenario() {
  let (mut s, clock) = store();
  let id = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  clock.advance(Duration::hours(2));

  let updated = s
    .review(&id, Decision::Rejected, Some(RejectionReason::InvalidDate))
    .unwrap();
  assert_eq!(updated.status, RequestStatus::Rejected);
  assert_eq!(updated.updated_at, Some(clock.now()));

  for partition in [Partition::PendingRequests, Partition::StudentRequests] {
    let records = s.load(partition);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, id);
    assert_eq!(record.status, RequestStatus::Rejected);
    assert_eq!(record.rejection_reason, Some(RejectionReason::InvalidDate));
    assert!(record.updated_at.is_some());
  }
  assert!(s.load(Partition::ApprovedRequests).is_empty());

  let stored = s.backend().get("studentRequests").unwrap().unwrap();
  assert_eq!(stored[0]["rejectionReason"], "Invalid date");
}

#[test]
fn hod_approval_copies_into_approved() {
  let (mut s, _) = store();
  let id = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  s.review(&id, Decision::Approved, None).unwrap();

  let approved = s.load(Partition::ApprovedRequests);
  assert_eq!(approved.len(), 1);
  assert_eq!(approved[0].id, id);
  assert_eq!(approved[0].status, RequestStatus::Approved);
}

#[test]
fn faculty_approval_does_not_copy_into_approved() {
  let (mut s, _) = store();
  let id = s.submit(&math(Recipient::Faculty)).unwrap().remove(0).id;
  s.review(&id, Decision::Approved, None).unwrap();

  assert!(s.load(Partition::ApprovedRequests).is_empty());
  assert_eq!(s.load(Partition::StudentRequests)[0].status, RequestStatus::Approved);
  assert_eq!(
    s.load(Partition::FacultyPendingRequests)[0].status,
    RequestStatus::Approved
  );
}

#[test]
fn approval_drops_rejection_reason() {
  let (mut s, _) = store();
  let id = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  let updated = s
    .review(&id, Decision::Approved, Some(RejectionReason::Other))
    .unwrap();
  assert_eq!(updated.rejection_reason, None);
}

#[test]
fn fan_out_records_transition_independently() {
  let (mut s, _) = store();
  let created = s.submit(&math(Recipient::Both)).unwrap();
  let (hod_id, faculty_id) = (created[0].id.clone(), created[1].id.clone());

  s.review(&hod_id, Decision::Rejected, None).unwrap();

  let history = s.load(Partition::StudentRequests);
  let status_of = |id: &str| history.iter().find(|r| r.id == id).unwrap().status;
  assert_eq!(status_of(&hod_id), RequestStatus::Rejected);
  assert_eq!(status_of(&faculty_id), RequestStatus::Pending);
  assert_eq!(s.pending(Queue::Faculty).len(), 1);
}

#[test]
fn second_review_fails_and_leaves_state_unchanged() {
  let (mut s, clock) = store();
  let id = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  s.review(&id, Decision::Rejected, Some(RejectionReason::InvalidDate))
    .unwrap();

  let before_queue = s.load(Partition::PendingRequests);
  let before_history = s.load(Partition::StudentRequests);
  clock.advance(Duration::hours(1));

  let err = s.review(&id, Decision::Approved, None).unwrap_err();
  assert!(matches!(
    err,
    Error::InvalidState { status: RequestStatus::Rejected, .. }
  ));
  assert_eq!(s.load(Partition::PendingRequests), before_queue);
  assert_eq!(s.load(Partition::StudentRequests), before_history);
  assert!(s.load(Partition::ApprovedRequests).is_empty());
}

#[test]
fn review_unknown_id_is_not_found() {
  let (mut s, _) = store();
  let err = s.review("nope", Decision::Approved, None).unwrap_err();
  assert!(matches!(err, Error::NotFound(ref id) if id == "nope"));
  assert!(matches!(s.queue_of("nope"), Err(Error::NotFound(_))));
}

#[test]
fn review_emits_outcome_notification() {
  let (mut s, _) = store();
  let id = s.submit(&math(Recipient::Faculty)).unwrap().remove(0).id;
  s.review(&id, Decision::Rejected, Some(RejectionReason::DuplicateRequest))
    .unwrap();

  let latest = &s.notifier().list()[0];
  assert_eq!(latest.kind, NotificationKind::Error);
  assert_eq!(latest.related_request_id.as_deref(), Some(id.as_str()));
  assert!(latest.message.starts_with("Faculty rejected"));
  assert!(latest.message.ends_with(": Duplicate request"));
}

#[test]
fn notification_times_follow_the_store_clock() {
  let (mut s, clock) = store();
  let submitted = s.submit(&math(Recipient::Hod)).unwrap().remove(0);
  clock.advance(Duration::hours(3));
  let reviewed = s.review(&submitted.id, Decision::Approved, None).unwrap();

  let notes = s.notifier().list();
  assert_eq!(notes[1].timestamp, submitted.submitted_at);
  assert_eq!(Some(notes[0].timestamp), reviewed.updated_at);
  assert_eq!(notes[0].timestamp, s.now());
}

#[test]
fn missing_mirror_is_restored_on_review() {
  let (mut s, _) = store();
  let id = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  s.backend_mut().put("studentRequests", json!([])).unwrap();

  s.review(&id, Decision::Approved, None).unwrap();
  let history = s.load(Partition::StudentRequests);
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].status, RequestStatus::Approved);
}

#[test]
fn queue_of_reports_owning_queue() {
  let (mut s, _) = store();
  let created = s.submit(&math(Recipient::Both)).unwrap();
  assert_eq!(s.queue_of(&created[0].id).unwrap(), Queue::Hod);
  assert_eq!(s.queue_of(&created[1].id).unwrap(), Queue::Faculty);
}

// ─── Bulk & keyword review ───────────────────────────────────────────────────

#[test]
fn bulk_review_counts_only_successes() {
  let (mut s, _) = store();
  let a = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  let b = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  let c = s.submit(&math(Recipient::Faculty)).unwrap().remove(0).id;
  s.review(&b, Decision::Rejected, None).unwrap();

  let count = s.bulk_review([a.as_str(), b.as_str(), "missing", c.as_str()], Decision::Approved);
  assert_eq!(count, 2);

  assert!(s.pending(Queue::Hod).is_empty());
  assert!(s.pending(Queue::Faculty).is_empty());
  let approved: Vec<_> = s
    .load(Partition::ApprovedRequests)
    .into_iter()
    .map(|r| r.id)
    .collect();
  assert_eq!(approved, [a]);
}

#[test]
fn keyword_review_matches_pending_subset_only() {
  let (mut s, _) = store();
  let fever = s
    .submit(&NewRequest::new("student1", "Math", "2024-03-10", "High FEVER", Recipient::Hod))
    .unwrap()
    .remove(0)
    .id;
  let physics = s
    .submit(&NewRequest::new("student1", "Physics", "2024-03-11", "wedding", Recipient::Hod))
    .unwrap()
    .remove(0)
    .id;
  let old_fever = s
    .submit(&NewRequest::new("student1", "Chemistry", "2024-03-12", "fever", Recipient::Hod))
    .unwrap()
    .remove(0)
    .id;
  let faculty_fever = s
    .submit(&NewRequest::new("student1", "Math", "2024-03-12", "fever", Recipient::Faculty))
    .unwrap()
    .remove(0)
    .id;
  s.review(&old_fever, Decision::Approved, None).unwrap();

  let count = s.keyword_review(Queue::Hod, "fever", Decision::Rejected);
  assert_eq!(count, 1);

  let history = s.load(Partition::StudentRequests);
  let status_of = |id: &str| history.iter().find(|r| r.id == id).unwrap().status;
  assert_eq!(status_of(&fever), RequestStatus::Rejected);
  assert_eq!(status_of(&physics), RequestStatus::Pending);
  assert_eq!(status_of(&old_fever), RequestStatus::Approved);
  assert_eq!(status_of(&faculty_fever), RequestStatus::Pending);
}

#[test]
fn blank_keyword_is_a_no_op() {
  let (mut s, _) = store();
  s.submit(&math(Recipient::Hod)).unwrap();
  assert_eq!(s.keyword_review(Queue::Hod, "   ", Decision::Approved), 0);
  assert_eq!(s.pending(Queue::Hod).len(), 1);
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[test]
fn load_orders_urgent_then_newest() {
  let (mut s, clock) = store();
  let urgent_old = s.submit(&math(Recipient::Hod).urgent(true)).unwrap().remove(0).id;
  clock.advance(Duration::hours(1));
  let plain_mid = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  clock.advance(Duration::hours(1));
  let plain_new = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;

  assert_eq!(ids(&s, Partition::PendingRequests), [urgent_old, plain_new, plain_mid]);
}

#[test]
fn approved_feed_orders_most_recently_decided_first() {
  let (mut s, clock) = store();
  let first = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  clock.advance(Duration::hours(1));
  let second = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  clock.advance(Duration::hours(1));
  s.review(&second, Decision::Approved, None).unwrap();
  clock.advance(Duration::hours(1));
  s.review(&first, Decision::Approved, None).unwrap();

  assert_eq!(ids(&s, Partition::ApprovedRequests), [first, second]);
}

#[test]
fn query_filters_partition() {
  let (mut s, _) = store();
  s.submit(&NewRequest::new("student1", "Math", "2024-03-10", "sick", Recipient::Hod))
    .unwrap();
  let physics = s
    .submit(&NewRequest::new("student1", "Physics", "2024-03-20", "sick", Recipient::Hod))
    .unwrap()
    .remove(0)
    .id;

  let filter = RequestFilter {
    subject: Some("Physics".into()),
    date_from: Some("2024-03-15".parse().unwrap()),
    ..Default::default()
  };
  let hits = s.query(Partition::StudentRequests, &filter);
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].id, physics);
  assert_eq!(s.query(Partition::StudentRequests, &filter), hits);
  assert_eq!(s.subjects(Partition::StudentRequests), ["Math", "Physics"]);
}

#[test]
fn corrupt_partition_reads_as_empty() {
  let (mut s, _) = store();
  s.backend_mut()
    .put("pendingRequests", json!({ "garbage": true }))
    .unwrap();
  assert!(s.load(Partition::PendingRequests).is_empty());

  // The next write replaces the corrupt blob.
  s.submit(&math(Recipient::Hod)).unwrap();
  assert_eq!(s.load(Partition::PendingRequests).len(), 1);
}

#[test]
fn statistics_over_partition() {
  let (mut s, clock) = store();
  let a = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  let b = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  s.submit(&math(Recipient::Hod)).unwrap();
  s.submit(&math(Recipient::Hod)).unwrap();
  clock.advance(Duration::hours(3));
  s.review(&a, Decision::Approved, None).unwrap();
  s.review(&b, Decision::Rejected, None).unwrap();

  let stats = s.statistics(Partition::PendingRequests, &clock.now());
  assert_eq!(stats.total, 4);
  assert_eq!(stats.pending, 2);
  assert_eq!(stats.approval_rate, 25);
  assert_eq!(stats.avg_response_hours, Some(3));
  assert_eq!(stats.todays_workload, 4);
  assert_eq!(stats.stale, 0);
}

// ─── Notification sink failures ──────────────────────────────────────────────

struct BrokenSink;

impl NotificationSink for BrokenSink {
  fn notify(&mut self, _: NewNotification) -> crate::Result<()> {
    Err(Error::Validation("sink is down".into()))
  }
}

#[test]
fn failing_sink_does_not_affect_store() {
  let mut s = RequestStore::new(MemoryBackend::new(), BrokenSink);
  let id = s.submit(&math(Recipient::Hod)).unwrap().remove(0).id;
  s.review(&id, Decision::Approved, None).unwrap();
  assert_eq!(s.load(Partition::ApprovedRequests).len(), 1);
}
