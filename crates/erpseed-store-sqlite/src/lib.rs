//! SQLite backend for the erpseed object store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod snapshot;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use snapshot::Snapshot;
pub use store::SqliteStore;
