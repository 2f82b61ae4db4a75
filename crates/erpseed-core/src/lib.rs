//! Core types and trait definitions for erpseed.
//!
//! This crate knows nothing about SQLite or the command line. It defines the
//! record model, the [`store::ConfigStore`] abstraction that backends
//! implement, the typed configuration targets, and the idempotent upserter
//! that every provisioning task is built on.

pub mod error;
pub mod query;
pub mod record;
pub mod session;
pub mod store;
pub mod target;
pub mod upsert;

pub use error::{Error, Result};
pub use session::Session;
