//! Session context: who is acting, and what their role allows.
//!
//! Credentials come from a fixed demo table. This gates which queue a user
//! works on; it is not a security boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::{
  Error, Result,
  backend::Backend,
  partition::{Partition, Queue},
};

pub const USERNAME_KEY: &str = "username";
pub const ROLE_KEY: &str = "userRole";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
  Student,
  Faculty,
  Hod,
}

impl Role {
  /// The queue this role reviews, if any.
  pub fn queue(self) -> Option<Queue> {
    match self {
      Self::Student => None,
      Self::Faculty => Some(Queue::Faculty),
      Self::Hod => Some(Queue::Hod),
    }
  }

  pub fn can_read(self, partition: Partition) -> bool {
    matches!(
      (self, partition),
      (Self::Student, Partition::StudentRequests)
        | (Self::Hod, Partition::PendingRequests)
        | (Self::Faculty, Partition::FacultyPendingRequests)
        | (Self::Faculty, Partition::ApprovedRequests)
    )
  }
}

/// `(username, password, role)` for every account the portal knows.
pub const DEMO_USERS: &[(&str, &str, Role)] = &[
  ("student1", "password", Role::Student),
  ("hod1", "password", Role::Hod),
  ("faculty1", "password", Role::Faculty),
];

/// The logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub username: String,
  pub role:     Role,
}

impl Session {
  /// Check `username`/`password` against [`DEMO_USERS`].
  pub fn authenticate(username: &str, password: &str) -> Result<Self> {
    DEMO_USERS
      .iter()
      .find(|(user, pass, _)| *user == username && *pass == password)
      .map(|(user, _, role)| Self {
        username: (*user).to_owned(),
        role:     *role,
      })
      .ok_or(Error::InvalidCredentials)
  }

  pub fn require_role(&self, role: Role, action: &'static str) -> Result<()> {
    if self.role == role {
      Ok(())
    } else {
      Err(Error::Forbidden { role: self.role, action })
    }
  }

  /// The queue this session reviews; students have none.
  pub fn require_queue(&self) -> Result<Queue> {
    self.role.queue().ok_or(Error::Forbidden {
      role:   self.role,
      action: "review requests",
    })
  }

  pub fn require_read(&self, partition: Partition) -> Result<()> {
    if self.role.can_read(partition) {
      Ok(())
    } else {
      Err(Error::Forbidden {
        role:   self.role,
        action: "read this partition",
      })
    }
  }

  // ── Persistence ─────────────────────────────────────────────────────────

  /// Load the saved session. Missing, unrecognised or unreadable entries mean
  /// nobody is logged in.
  pub fn load<B: Backend>(backend: &B) -> Option<Self> {
    let read = |key: &str| match backend.get(key) {
      Ok(Some(Value::String(value))) => Some(value),
      Ok(_) => None,
      Err(err) => {
        tracing::warn!(key, error = %err, "session unreadable, treating as logged out");
        None
      }
    };

    let username = read(USERNAME_KEY)?;
    let role = read(ROLE_KEY)?.parse().ok()?;
    Some(Self { username, role })
  }

  pub fn save<B: Backend>(&self, backend: &mut B) -> Result<()> {
    backend
      .put_many(vec![
        (USERNAME_KEY.to_owned(), Value::String(self.username.clone())),
        (ROLE_KEY.to_owned(), Value::String(self.role.to_string())),
      ])
      .map_err(Error::storage)
  }

  pub fn clear<B: Backend>(backend: &mut B) -> Result<()> {
    backend.remove(USERNAME_KEY).map_err(Error::storage)?;
    backend.remove(ROLE_KEY).map_err(Error::storage)
  }
}
