//! Core types and the request store for the Excusal attendance portal.
//!
//! This crate is free of HTTP and filesystem dependencies. Persistence goes
//! through the [`backend::Backend`] trait; `excusal-store-file` provides the
//! on-disk implementation and [`backend::MemoryBackend`] serves tests.

pub mod backend;
pub mod error;
pub mod holiday;
pub mod notify;
pub mod partition;
pub mod query;
pub mod request;
pub mod session;
pub mod stats;
pub mod store;

pub use error::{Error, Result};
pub use store::RequestStore;

#[cfg(test)]
mod tests;
