//! The `Backend` trait: a flat key-value blob of JSON values.
//!
//! This mirrors browser local storage: every key holds one JSON document that
//! is read in full and rewritten in full. Backends make no attempt at
//! multi-writer consistency; callers perform synchronous read-modify-write.

use std::{collections::BTreeMap, convert::Infallible};

use serde_json::Value;

/// Abstraction over the persisted key-value blob.
///
/// Implemented by `excusal-store-file` for on-disk storage and by
/// [`MemoryBackend`] for tests and ephemeral use.
pub trait Backend {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read the value stored under `key`. Absent keys yield `None`.
  fn get(&self, key: &str) -> Result<Option<Value>, Self::Error>;

  /// Write several keys in one step.
  ///
  /// A state transition touches up to three partitions; backends should
  /// apply the whole batch or none of it.
  fn put_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), Self::Error>;

  fn put(&mut self, key: &str, value: Value) -> Result<(), Self::Error> {
    self.put_many(vec![(key.to_owned(), value)])
  }

  fn remove(&mut self, key: &str) -> Result<(), Self::Error>;
}

// ─── In-memory ───────────────────────────────────────────────────────────────

/// A backend that keeps everything in a map. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
  entries: BTreeMap<String, Value>,
}

impl MemoryBackend {
  pub fn new() -> Self { Self::default() }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }
}

impl Backend for MemoryBackend {
  type Error = Infallible;

  fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
    Ok(self.entries.get(key).cloned())
  }

  fn put_many(&mut self, entries: Vec<(String, Value)>) -> Result<(), Self::Error> {
    self.entries.extend(entries);
    Ok(())
  }

  fn remove(&mut self, key: &str) -> Result<(), Self::Error> {
    self.entries.remove(key);
    Ok(())
  }
}
