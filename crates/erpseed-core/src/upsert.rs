//! The idempotent configuration upserter.
//!
//! [`upsert`] finds the record a [`ConfigTarget`] describes within a
//! [`Scope`], creates it when absent, and otherwise writes only the managed
//! fields whose current value differs. A second run over unchanged input
//! performs no writes.
//!
//! [`prune`] layers reconciliation on top: records of a kind whose name is not
//! in an allowed set are deleted, unless something still references them.

use tracing::{info, warn};

use crate::{
  Error, Result, Session,
  query::{Filter, Query},
  record::{FieldMap, Record, RecordId, Value},
  store::{ConfigStore, Unlinked},
  target::{ConfigTarget, Scope, TargetKind},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// What a single upsert (or reconcile, or link) did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  Created,
  Updated { fields: Vec<String> },
  Unchanged,
}

impl Outcome {
  pub fn is_change(&self) -> bool { !matches!(self, Self::Unchanged) }
}

/// The record after an upsert, and how it got there.
#[derive(Debug, Clone)]
pub struct Upserted {
  pub record:  Record,
  pub outcome: Outcome,
}

impl Upserted {
  pub fn id(&self) -> RecordId { self.record.id }
}

/// What [`prune`] removed and what it had to leave behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pruned {
  pub removed: Vec<String>,
  /// `(name, reason)` of records still referenced elsewhere.
  pub in_use:  Vec<(String, String)>,
}

// ─── Upsert ──────────────────────────────────────────────────────────────────

/// Make `target` exist in `scope` with its managed fields as desired.
pub async fn upsert<S: ConfigStore>(
  session: &Session<'_, S>,
  scope: Scope,
  target: &ConfigTarget,
) -> Result<Upserted> {
  let query = target.lookup(scope)?;
  let mut matches = session.search(&query).await.map_err(Error::store)?;

  if matches.len() > 1 {
    // Duplicates are left alone; the lowest id wins.
    warn!(
      target = %target.label(),
      count = matches.len(),
      "several records match; using the first"
    );
  }

  if matches.is_empty() {
    let fields = target.fields_in(scope)?;
    let record = session
      .create(target.model(), fields)
      .await
      .map_err(Error::store)?;
    info!(id = %record.id, ?scope, "created {}", target.label());
    return Ok(Upserted { record, outcome: Outcome::Created });
  }

  let existing = matches.swap_remove(0);
  let upserted = reconcile(session, existing, target.managed_fields()).await?;
  match &upserted.outcome {
    Outcome::Updated { fields } => {
      info!(id = %upserted.id(), ?fields, "updated {}", target.label());
    }
    _ => tracing::debug!(id = %upserted.id(), "unchanged {}", target.label()),
  }
  Ok(upserted)
}

/// Write the entries of `desired` that differ from `record`, in one write.
pub async fn reconcile<S: ConfigStore>(
  session: &Session<'_, S>,
  record: Record,
  desired: FieldMap,
) -> Result<Upserted> {
  let delta: FieldMap = desired
    .into_iter()
    .filter(|(name, value)| !record.field(name).same_as(value))
    .collect();

  if delta.is_empty() {
    return Ok(Upserted { record, outcome: Outcome::Unchanged });
  }

  let fields = delta.keys().cloned().collect();
  let record = session
    .write(&record.model, record.id, delta)
    .await
    .map_err(Error::store)?;
  Ok(Upserted {
    record,
    outcome: Outcome::Updated { fields },
  })
}

/// Add `to` to the many-to-many `field` of `record`. Existing members are
/// kept; nothing is written when `to` is already a member.
pub async fn link<S: ConfigStore>(
  session: &Session<'_, S>,
  record: Record,
  field: &str,
  to: RecordId,
) -> Result<Upserted> {
  let current = record.refs(field);
  if current.contains(&to) {
    return Ok(Upserted { record, outcome: Outcome::Unchanged });
  }

  let mut members = current.to_vec();
  members.push(to);
  let mut delta = FieldMap::new();
  delta.insert(field.to_owned(), Value::Refs(members));

  let record = session
    .write(&record.model, record.id, delta)
    .await
    .map_err(Error::store)?;
  Ok(Upserted {
    record,
    outcome: Outcome::Updated { fields: vec![field.to_owned()] },
  })
}

// ─── Prune ───────────────────────────────────────────────────────────────────

/// Delete every `kind` record in `scope` whose name is not in `allowed`.
///
/// A record that is still referenced is reported in [`Pruned::in_use`] and
/// left intact; the remaining deletions go ahead.
pub async fn prune<S: ConfigStore>(
  session: &Session<'_, S>,
  scope: Scope,
  kind: TargetKind,
  allowed: &[&str],
) -> Result<Pruned> {
  let mut query = Query::new(kind.model())
    .filter(Filter::not_in("name", allowed.iter().copied()));
  if let Some(filter) = kind.scope_filter(scope)? {
    query = query.filter(filter);
  }

  let mut pruned = Pruned::default();
  for record in session.search(&query).await.map_err(Error::store)? {
    let name = record.display_name().to_owned();
    match session
      .unlink(&record.model, record.id)
      .await
      .map_err(Error::store)?
    {
      Unlinked::Deleted => {
        info!(id = %record.id, "removed {kind} '{name}'");
        pruned.removed.push(name);
      }
      Unlinked::InUse(reason) => {
        warn!(id = %record.id, %reason, "could not remove {kind} '{name}'; it is in use");
        pruned.in_use.push((name, reason));
      }
    }
  }
  Ok(pruned)
}

// ─── Prerequisites ───────────────────────────────────────────────────────────

/// The first record matching `query`, or [`Error::MissingPrerequisite`]
/// naming `what`.
pub async fn require<S: ConfigStore>(
  session: &Session<'_, S>,
  query: &Query,
  what: &str,
) -> Result<Record> {
  session
    .search(query)
    .await
    .map_err(Error::store)?
    .into_iter()
    .next()
    .ok_or_else(|| Error::MissingPrerequisite(what.to_owned()))
}

/// Fail with [`Error::MissingPrerequisite`] unless `model` is installed.
pub async fn require_model<S: ConfigStore>(
  session: &Session<'_, S>,
  model: &str,
) -> Result<()> {
  if session.has_model(model).await.map_err(Error::store)? {
    Ok(())
  } else {
    Err(Error::MissingPrerequisite(format!("model {model} is not installed")))
  }
}
