//! Search criteria for [`ConfigStore::search`](crate::store::ConfigStore::search).
//!
//! A [`Query`] is a model name plus a conjunction of [`Filter`]s. Disjunction
//! is expressed with [`Filter::Any`].

use crate::record::{Record, Value};

// ─── Filter ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
  /// Field equals the value. A missing field equals `Null`. Against a `Refs`
  /// field, a `Ref` value matches when it is one of the members.
  Eq(String, Value),
  /// Case-insensitive substring match on a text field.
  ILike(String, String),
  /// Field equals one of the values.
  In(String, Vec<Value>),
  /// Field equals none of the values.
  NotIn(String, Vec<Value>),
  /// At least one of the nested filters matches.
  Any(Vec<Filter>),
}

impl Filter {
  pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
    Self::Eq(field.into(), value.into())
  }

  pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
    Self::ILike(field.into(), pattern.into())
  }

  pub fn is_in<V: Into<Value>>(
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
  ) -> Self {
    Self::In(field.into(), values.into_iter().map(Into::into).collect())
  }

  pub fn not_in<V: Into<Value>>(
    field: impl Into<String>,
    values: impl IntoIterator<Item = V>,
  ) -> Self {
    Self::NotIn(field.into(), values.into_iter().map(Into::into).collect())
  }

  pub fn any(filters: impl IntoIterator<Item = Filter>) -> Self {
    Self::Any(filters.into_iter().collect())
  }

  pub fn matches(&self, record: &Record) -> bool {
    match self {
      Self::Eq(field, value) => field_equals(record.field(field), value),
      Self::ILike(field, pattern) => record
        .text(field)
        .is_some_and(|text| text.to_lowercase().contains(&pattern.to_lowercase())),
      Self::In(field, values) => {
        values.iter().any(|v| field_equals(record.field(field), v))
      }
      Self::NotIn(field, values) => {
        !values.iter().any(|v| field_equals(record.field(field), v))
      }
      Self::Any(filters) => filters.iter().any(|f| f.matches(record)),
    }
  }
}

fn field_equals(current: &Value, wanted: &Value) -> bool {
  match (current, wanted) {
    (Value::Refs(ids), Value::Ref(id)) => ids.contains(id),
    _ => current.same_as(wanted),
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// A search over the records of one model. Results are ordered by record id.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
  pub model:   String,
  pub filters: Vec<Filter>,
  pub limit:   Option<usize>,
}

impl Query {
  pub fn new(model: impl Into<String>) -> Self {
    Self {
      model:   model.into(),
      filters: Vec::new(),
      limit:   None,
    }
  }

  pub fn filter(mut self, filter: Filter) -> Self {
    self.filters.push(filter);
    self
  }

  pub fn filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
    self.filters.extend(filters);
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  /// Whether `record` satisfies every filter. The model is not checked.
  pub fn matches(&self, record: &Record) -> bool {
    self.filters.iter().all(|f| f.matches(record))
  }
}
