//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Field maps are compact JSON objects using
//! the tagged [`Value`](erpseed_core::record::Value) representation.

use chrono::{DateTime, Utc};
use erpseed_core::record::{FieldMap, Record, RecordId};

use crate::Result;

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_fields(fields: &FieldMap) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

pub fn decode_fields(s: &str) -> Result<FieldMap> { Ok(serde_json::from_str(s)?) }

/// Raw columns read directly from a `records` row.
pub struct RawRecord {
  pub record_id:   i64,
  pub model:       String,
  pub fields_json: String,
}

impl RawRecord {
  pub const COLUMNS: &'static str = "record_id, model, fields_json";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:   row.get(0)?,
      model:       row.get(1)?,
      fields_json: row.get(2)?,
    })
  }

  pub fn into_record(self) -> Result<Record> {
    Ok(Record {
      id:     RecordId(self.record_id),
      model:  self.model,
      fields: decode_fields(&self.fields_json)?,
    })
  }
}
