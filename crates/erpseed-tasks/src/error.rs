//! Error type for `erpseed-tasks`.

use thiserror::Error;

use crate::{Task, TaskReport};

/// A run of several tasks stopped by an unexpected error.
///
/// The failing task was rolled back. The tasks in `completed` ran before it
/// and stay committed.
#[derive(Debug, Error)]
#[error("{task} aborted: {source}")]
pub struct Aborted {
  pub task:      Task,
  pub completed: Vec<(Task, TaskReport)>,
  #[source]
  pub source:    erpseed_core::Error,
}
