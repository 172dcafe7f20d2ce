//! JSON REST API for the Excusal portal.
//!
//! Exposes an axum [`Router`] over a single shared [`RequestStore`]. Every
//! route requires HTTP Basic auth against the portal's account table.
//!
//! Handlers lock the store for one synchronous read-modify-write and never
//! hold the lock across an await.

pub mod auth;
pub mod error;
pub mod notifications;
pub mod partitions;
pub mod requests;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
  Router,
  routing::{get, post},
};
use excusal_core::{RequestStore, backend::Backend, notify::NotificationLog};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Where the HTTP server listens.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host: String,
  #[serde(default = "default_port")]
  pub port: u16,
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host: default_host(),
      port: default_port(),
    }
  }
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

// ─── Application state ────────────────────────────────────────────────────────

/// The store as served: requests and notifications over the same backend.
pub type Store<B> = RequestStore<B, NotificationLog<B>>;

/// Shared state threaded through all axum handlers.
pub struct AppState<B> {
  store: Arc<Mutex<Store<B>>>,
}

impl<B> Clone for AppState<B> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

impl<B: Backend> AppState<B> {
  pub fn new(store: Store<B>) -> Self {
    Self {
      store: Arc::new(Mutex::new(store)),
    }
  }

  /// Lock the store. Each store operation writes its batch in one step, so
  /// the state behind a poisoned lock is still whole.
  pub fn lock(&self) -> MutexGuard<'_, Store<B>> {
    self.store.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router over `state`.
pub fn router<B>(state: AppState<B>) -> Router<()>
where
  B: Backend + Send + 'static,
{
  Router::new()
    // Requests
    .route("/requests", post(requests::submit::<B>))
    .route("/requests/{id}/review", post(requests::review::<B>))
    .route("/queues/{queue}/bulk-review", post(requests::bulk_review::<B>))
    .route("/queues/{queue}/keyword-review", post(requests::keyword_review::<B>))
    .route("/rejection-reasons", get(requests::rejection_reasons))
    // Partitions
    .route("/partitions/{partition}", get(partitions::list::<B>))
    .route("/partitions/{partition}/subjects", get(partitions::subjects::<B>))
    .route("/partitions/{partition}/stats", get(partitions::stats::<B>))
    .route("/partitions/{partition}/export.csv", get(partitions::export_csv::<B>))
    // Notifications
    .route(
      "/notifications",
      get(notifications::list::<B>).delete(notifications::clear::<B>),
    )
    .route("/notifications/read-all", post(notifications::read_all::<B>))
    .route("/notifications/{id}/read", post(notifications::read_one::<B>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
