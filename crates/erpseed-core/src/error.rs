//! Error types for `erpseed-core`.

use thiserror::Error;

use crate::record::RecordId;

#[derive(Debug, Error)]
pub enum Error {
  /// A record or module the operation depends on does not exist yet.
  #[error("missing prerequisite: {0}")]
  MissingPrerequisite(String),

  #[error("{kind} records are shared and cannot be scoped to company {company}")]
  ScopeMismatch {
    kind:    &'static str,
    company: RecordId,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error. Used as `.map_err(Error::store)`.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn is_missing_prerequisite(&self) -> bool {
    matches!(self, Self::MissingPrerequisite(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
