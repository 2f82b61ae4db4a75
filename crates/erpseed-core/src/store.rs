//! The `ConfigStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `erpseed-store-sqlite`).
//! The upserter and the provisioning tasks depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  query::Query,
  record::{FieldMap, Record, RecordId},
};

/// Result of [`ConfigStore::unlink`].
///
/// A record that other records still reference is not an error: the caller
/// decides whether a blocked delete matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unlinked {
  Deleted,
  /// The record is still referenced elsewhere and was left intact.
  InUse(String),
}

/// Abstraction over the ERP's object store.
///
/// Writes are only visible to other connections once [`commit`] succeeds.
/// Backends must support exactly one open transaction at a time.
///
/// [`commit`]: ConfigStore::commit
pub trait ConfigStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Whether the module providing `model` is installed.
  fn has_model<'a>(
    &'a self,
    model: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Fetch a record of `model` by id. Returns `None` if not found.
  fn get<'a>(
    &'a self,
    model: &'a str,
    id: RecordId,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  /// All records matching `query`, ordered by id.
  fn search<'a>(
    &'a self,
    query: &'a Query,
  ) -> impl Future<Output = Result<Vec<Record>, Self::Error>> + Send + 'a;

  /// Resolve a named constant such as `base.group_user`.
  fn resolve_ref<'a>(
    &'a self,
    xml_id: &'a str,
  ) -> impl Future<Output = Result<Option<Record>, Self::Error>> + Send + 'a;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Create a record and return it with its assigned id.
  fn create<'a>(
    &'a self,
    model: &'a str,
    fields: FieldMap,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + 'a;

  /// Overwrite the given fields of an existing record. Fields not present in
  /// `fields` are left as they are.
  fn write<'a>(
    &'a self,
    model: &'a str,
    id: RecordId,
    fields: FieldMap,
  ) -> impl Future<Output = Result<Record, Self::Error>> + Send + 'a;

  /// Delete a record unless something still references it.
  fn unlink<'a>(
    &'a self,
    model: &'a str,
    id: RecordId,
  ) -> impl Future<Output = Result<Unlinked, Self::Error>> + Send + 'a;

  // ── Transactions ──────────────────────────────────────────────────────

  fn begin(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn commit(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn rollback(&self)
  -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
