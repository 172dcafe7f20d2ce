//! File backend for the Excusal request store.
//!
//! The whole key-value blob lives in one JSON object on disk.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::FileBackend;
