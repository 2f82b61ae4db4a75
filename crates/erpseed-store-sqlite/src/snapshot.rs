//! JSON snapshots of a whole store.
//!
//! A snapshot is how a store is prepared before provisioning (installed
//! models, companies, countries, accounts, named constants) and how its state
//! is inspected afterwards. Record ids are preserved on import so that
//! relation values inside the snapshot stay valid.

use std::collections::BTreeMap;

use erpseed_core::record::{Record, RecordId};
use serde::{Deserialize, Serialize};

use crate::{
  Result, SqliteStore,
  encode::{RawRecord, encode_dt, encode_fields},
  store::sync_links,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
  /// Installed record types. Models used by `records` are installed
  /// implicitly.
  #[serde(default)]
  pub models:  Vec<String>,
  #[serde(default)]
  pub records: Vec<Record>,
  /// Named constant → record id.
  #[serde(default)]
  pub refs:    BTreeMap<String, RecordId>,
}

impl SqliteStore {
  /// Load `snapshot` into the store in a single transaction and return the
  /// number of records written. Existing records with the same ids are
  /// replaced.
  pub async fn import(&self, snapshot: Snapshot) -> Result<usize> {
    let mut models = snapshot.models.clone();
    models.extend(snapshot.records.iter().map(|r| r.model.clone()));
    models.sort();
    models.dedup();

    let now = encode_dt(chrono::Utc::now());
    let rows = snapshot
      .records
      .iter()
      .map(|r| -> Result<(i64, String, String)> {
        Ok((r.id.0, r.model.clone(), encode_fields(&r.fields)?))
      })
      .collect::<Result<Vec<_>>>()?;
    let records = snapshot.records;
    let refs = snapshot.refs;

    let count = self
      .connection()
      .call(move |conn| {
        let tx = conn.transaction()?;
        for model in &models {
          tx.execute(
            "INSERT OR IGNORE INTO models (name) VALUES (?1)",
            rusqlite::params![model],
          )?;
        }
        // Insert every row before any edge so forward references resolve.
        for (id, model, fields_json) in &rows {
          tx.execute(
            "INSERT INTO records (record_id, model, fields_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             ON CONFLICT (record_id) DO UPDATE SET
               model       = excluded.model,
               fields_json = excluded.fields_json,
               updated_at  = excluded.updated_at",
            rusqlite::params![id, model, fields_json, now],
          )?;
        }
        for record in &records {
          sync_links(&tx, record.id.0, &record.fields)?;
        }
        for (xml_id, id) in &refs {
          tx.execute(
            "INSERT OR REPLACE INTO refs (xml_id, record_id) VALUES (?1, ?2)",
            rusqlite::params![xml_id, id.0],
          )?;
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    tracing::info!(records = count, "snapshot imported");
    Ok(count)
  }

  /// Read the whole store back as a snapshot, records ordered by id.
  pub async fn export(&self) -> Result<Snapshot> {
    let (models, raws, refs) = self
      .connection()
      .call(|conn| {
        let models = conn
          .prepare("SELECT name FROM models ORDER BY name")?
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let raws = conn
          .prepare(&format!(
            "SELECT {} FROM records ORDER BY record_id",
            RawRecord::COLUMNS
          ))?
          .query_map([], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let refs = conn
          .prepare("SELECT xml_id, record_id FROM refs ORDER BY xml_id")?
          .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, RecordId(row.get(1)?)))
          })?
          .collect::<rusqlite::Result<BTreeMap<_, _>>>()?;
        Ok((models, raws, refs))
      })
      .await?;

    let records = raws
      .into_iter()
      .map(RawRecord::into_record)
      .collect::<Result<Vec<_>>>()?;
    Ok(Snapshot { models, records, refs })
  }
}
