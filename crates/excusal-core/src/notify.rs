//! Notifications emitted by the request store.
//!
//! The store treats its sink as fire-and-forget: a failing sink is logged and
//! never affects the state transition that produced the notification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

use crate::{Error, Result, backend::Backend};

/// Backend key the notification log is stored under.
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// Oldest entries beyond this count are dropped on append.
pub const MAX_NOTIFICATIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
  Info,
  Success,
  Warning,
  Error,
}

/// What the store hands to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
  pub message:            String,
  pub kind:               NotificationKind,
  pub related_request_id: Option<String>,
  /// When the transition that produced it happened.
  pub timestamp:          DateTime<Utc>,
}

/// A persisted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  pub id:                 String,
  pub message:            String,
  pub kind:               NotificationKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub related_request_id: Option<String>,
  pub timestamp:          DateTime<Utc>,
  #[serde(default)]
  pub read:               bool,
}

// ─── Sink ────────────────────────────────────────────────────────────────────

/// Receives notifications from [`crate::store::RequestStore`].
pub trait NotificationSink {
  fn notify(&mut self, notification: NewNotification) -> Result<()>;
}

/// A sink that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl NotificationSink for Discard {
  fn notify(&mut self, _: NewNotification) -> Result<()> { Ok(()) }
}

// ─── Persisted log ───────────────────────────────────────────────────────────

/// Append-only notification list kept in a [`Backend`], newest first.
#[derive(Debug, Clone)]
pub struct NotificationLog<B> {
  backend: B,
}

impl<B: Backend> NotificationLog<B> {
  pub fn new(backend: B) -> Self { Self { backend } }

  pub fn backend(&self) -> &B { &self.backend }

  /// All notifications, newest first. An unreadable log reads as empty.
  pub fn list(&self) -> Vec<Notification> {
    let value = match self.backend.get(NOTIFICATIONS_KEY) {
      Ok(Some(value)) => value,
      Ok(None) => return Vec::new(),
      Err(err) => {
        tracing::warn!(error = %err, "notification log unreadable, treating as empty");
        return Vec::new();
      }
    };
    serde_json::from_value(value).unwrap_or_else(|err| {
      tracing::warn!(error = %err, "notification log corrupt, treating as empty");
      Vec::new()
    })
  }

  pub fn unread_count(&self) -> usize { self.list().iter().filter(|n| !n.read).count() }

  /// Mark one notification read. Returns `false` if no notification has `id`.
  pub fn mark_read(&mut self, id: &str) -> Result<bool> {
    let mut all = self.list();
    let Some(entry) = all.iter_mut().find(|n| n.id == id) else {
      return Ok(false);
    };
    entry.read = true;
    self.save(&all)?;
    Ok(true)
  }

  pub fn mark_all_read(&mut self) -> Result<()> {
    let mut all = self.list();
    for entry in &mut all {
      entry.read = true;
    }
    self.save(&all)
  }

  pub fn clear(&mut self) -> Result<()> {
    self.backend.remove(NOTIFICATIONS_KEY).map_err(Error::storage)
  }

  fn save(&mut self, all: &[Notification]) -> Result<()> {
    let value = serde_json::to_value(all)?;
    self.backend.put(NOTIFICATIONS_KEY, value).map_err(Error::storage)
  }
}

impl<B: Backend> NotificationSink for NotificationLog<B> {
  fn notify(&mut self, notification: NewNotification) -> Result<()> {
    let mut all = self.list();
    all.insert(0, Notification {
      id:                 Uuid::new_v4().to_string(),
      message:            notification.message,
      kind:               notification.kind,
      related_request_id: notification.related_request_id,
      timestamp:          notification.timestamp,
      read:               false,
    });
    all.truncate(MAX_NOTIFICATIONS);
    self.save(&all)
  }
}
