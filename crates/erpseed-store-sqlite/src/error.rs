//! Error type for `erpseed-store-sqlite`.

use erpseed_core::record::RecordId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The module providing this model is not installed.
  #[error("unknown model: {0}")]
  UnknownModel(String),

  #[error("{model} record {id} not found")]
  RecordNotFound { model: String, id: RecordId },

  #[error("record {id} has unreadable fields: {reason}")]
  CorruptRecord { id: RecordId, reason: String },

  /// A relation field points at a record that does not exist.
  #[error("reference to missing record {0}")]
  DanglingReference(RecordId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
