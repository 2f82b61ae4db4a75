//! Records as the ERP object store sees them.
//!
//! A record is a bag of named field values belonging to one model (record
//! type), e.g. `account.journal`. Record ids are unique across all models.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

// ─── Ids ─────────────────────────────────────────────────────────────────────

/// Store-assigned identifier of a record.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// ─── Values ──────────────────────────────────────────────────────────────────

/// Field name → value.
pub type FieldMap = BTreeMap<String, Value>;

/// A single field value.
///
/// `Ref` and `Refs` are relation edges: the store tracks them so that a
/// referenced record cannot be deleted out from under its referrers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
  /// Many-to-one relation.
  Ref(RecordId),
  /// Many-to-many relation; order is not significant.
  Refs(Vec<RecordId>),
  /// Embedded one-to-many rows owned by the record (e.g. payment term lines).
  Lines(Vec<FieldMap>),
}

static NULL: Value = Value::Null;

impl Value {
  /// Semantic equality used when diffing desired against current state.
  ///
  /// Integers and floats compare numerically, `Refs` compare as sets.
  pub fn same_as(&self, other: &Value) -> bool {
    match (self, other) {
      (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => {
        (*a as f64) == *b
      }
      (Self::Refs(a), Self::Refs(b)) => {
        let mut a = a.clone();
        let mut b = b.clone();
        a.sort_unstable();
        a.dedup();
        b.sort_unstable();
        b.dedup();
        a == b
      }
      _ => self == other,
    }
  }

  pub fn is_null(&self) -> bool { matches!(self, Self::Null) }

  pub fn as_text(&self) -> Option<&str> {
    match self {
      Self::Text(s) => Some(s),
      _ => None,
    }
  }

  /// Truthiness the way the ERP treats it: `Null` and `false` are falsy.
  pub fn as_bool(&self) -> bool {
    match self {
      Self::Bool(b) => *b,
      Self::Null => false,
      Self::Int(i) => *i != 0,
      _ => true,
    }
  }

  pub fn as_int(&self) -> Option<i64> {
    match self {
      Self::Int(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_ref_id(&self) -> Option<RecordId> {
    match self {
      Self::Ref(id) => Some(*id),
      _ => None,
    }
  }

  pub fn as_refs(&self) -> &[RecordId] {
    match self {
      Self::Refs(ids) => ids,
      _ => &[],
    }
  }

  /// Every record id this value points at, including ids nested in lines.
  pub fn referenced_ids(&self) -> Vec<RecordId> {
    match self {
      Self::Ref(id) => vec![*id],
      Self::Refs(ids) => ids.clone(),
      Self::Lines(rows) => rows
        .iter()
        .flat_map(|row| row.values().flat_map(Value::referenced_ids))
        .collect(),
      _ => Vec::new(),
    }
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self { Self::Bool(b) }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self { Self::Int(i) }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self { Self::Float(f) }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Self::Text(s) }
}

impl From<RecordId> for Value {
  fn from(id: RecordId) -> Self { Self::Ref(id) }
}

impl From<Option<RecordId>> for Value {
  fn from(id: Option<RecordId>) -> Self { id.map_or(Self::Null, Self::Ref) }
}

impl From<Vec<RecordId>> for Value {
  fn from(ids: Vec<RecordId>) -> Self { Self::Refs(ids) }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// A persisted record, as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
  pub id:     RecordId,
  pub model:  String,
  pub fields: FieldMap,
}

impl Record {
  /// The value of `name`, or `Null` when the field is not set.
  pub fn field(&self, name: &str) -> &Value {
    self.fields.get(name).unwrap_or(&NULL)
  }

  pub fn text(&self, name: &str) -> Option<&str> { self.field(name).as_text() }

  pub fn flag(&self, name: &str) -> bool { self.field(name).as_bool() }

  pub fn reference(&self, name: &str) -> Option<RecordId> {
    self.field(name).as_ref_id()
  }

  pub fn refs(&self, name: &str) -> &[RecordId] { self.field(name).as_refs() }

  /// Human-readable label for log lines.
  pub fn display_name(&self) -> &str { self.text("name").unwrap_or("?") }
}

/// Build a [`FieldMap`] from `name => value` pairs.
///
/// ```
/// use erpseed_core::{fields, record::Value};
///
/// let map = fields! { "name" => "Vale", "sequence" => 9_i64 };
/// assert_eq!(map["sequence"], Value::Int(9));
/// ```
#[macro_export]
macro_rules! fields {
  ($($name:expr => $value:expr),* $(,)?) => {{
    #[allow(unused_mut)]
    let mut map = $crate::record::FieldMap::new();
    $( map.insert(::std::string::String::from($name), $crate::record::Value::from($value)); )*
    map
  }};
}
