//! The SQLite implementation of [`ConfigStore`].

use std::path::Path;

use chrono::Utc;
use erpseed_core::{
  query::Query,
  record::{FieldMap, Record, RecordId},
  store::{ConfigStore, Unlinked},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{RawRecord, decode_fields, encode_dt, encode_fields},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An object store backed by a single SQLite file.
///
/// Clones share the inner connection and therefore one transaction.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Why a create or write was refused before touching the database.
enum Refused {
  UnknownModel,
  NotFound,
  Dangling(RecordId),
  Corrupt(String),
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub(crate) fn connection(&self) -> &tokio_rusqlite::Connection { &self.conn }

  /// Register record types as installed. Already-installed models are
  /// ignored.
  pub async fn install_models<I, M>(&self, models: I) -> Result<()>
  where
    I: IntoIterator<Item = M>,
    M: Into<String>,
  {
    let models: Vec<String> = models.into_iter().map(Into::into).collect();
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare("INSERT OR IGNORE INTO models (name) VALUES (?1)")?;
        for model in &models {
          stmt.execute(rusqlite::params![model])?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Bind the named constant `xml_id` to an existing record, replacing any
  /// previous binding.
  pub async fn bind_ref(&self, xml_id: &str, id: RecordId) -> Result<()> {
    let xml_id = xml_id.to_owned();
    let bound = self
      .conn
      .call(move |conn| {
        let exists = record_exists(conn, id.0)?;
        if exists {
          conn.execute(
            "INSERT OR REPLACE INTO refs (xml_id, record_id) VALUES (?1, ?2)",
            rusqlite::params![xml_id, id.0],
          )?;
        }
        Ok(exists)
      })
      .await?;
    if bound { Ok(()) } else { Err(Error::DanglingReference(id)) }
  }
}

// ─── Row helpers (run on the connection thread) ──────────────────────────────

fn record_exists(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM records WHERE record_id = ?1",
        rusqlite::params![id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn model_exists(conn: &rusqlite::Connection, model: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM models WHERE name = ?1",
        rusqlite::params![model],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn select_record(
  conn: &rusqlite::Connection,
  model: &str,
  id: i64,
) -> rusqlite::Result<Option<RawRecord>> {
  conn
    .query_row(
      &format!(
        "SELECT {} FROM records WHERE record_id = ?1 AND model = ?2",
        RawRecord::COLUMNS
      ),
      rusqlite::params![id, model],
      RawRecord::from_row,
    )
    .optional()
}

/// The first referenced id in `fields` that does not exist, if any.
fn first_dangling(
  conn: &rusqlite::Connection,
  fields: &FieldMap,
) -> rusqlite::Result<Option<RecordId>> {
  for value in fields.values() {
    for id in value.referenced_ids() {
      if !record_exists(conn, id.0)? {
        return Ok(Some(id));
      }
    }
  }
  Ok(None)
}

/// Replace the relation edges of every field in `fields`.
pub(crate) fn sync_links(
  conn: &rusqlite::Connection,
  src_id: i64,
  fields: &FieldMap,
) -> rusqlite::Result<()> {
  for (name, value) in fields {
    conn.execute(
      "DELETE FROM links WHERE src_id = ?1 AND field = ?2",
      rusqlite::params![src_id, name],
    )?;
    for dst in value.referenced_ids() {
      conn.execute(
        "INSERT OR IGNORE INTO links (src_id, field, dst_id) VALUES (?1, ?2, ?3)",
        rusqlite::params![src_id, name, dst.0],
      )?;
    }
  }
  Ok(())
}

// ─── ConfigStore impl ────────────────────────────────────────────────────────

impl ConfigStore for SqliteStore {
  type Error = Error;

  async fn has_model(&self, model: &str) -> Result<bool> {
    let model = model.to_owned();
    Ok(self.conn.call(move |conn| Ok(model_exists(conn, &model)?)).await?)
  }

  async fn get(&self, model: &str, id: RecordId) -> Result<Option<Record>> {
    let model = model.to_owned();
    let raw = self
      .conn
      .call(move |conn| Ok(select_record(conn, &model, id.0)?))
      .await?;
    raw.map(RawRecord::into_record).transpose()
  }

  async fn search(&self, query: &Query) -> Result<Vec<Record>> {
    // Filters are evaluated in Rust; configuration tables are small.
    let model = query.model.clone();
    let raws: Vec<RawRecord> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM records WHERE model = ?1 ORDER BY record_id",
          RawRecord::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![model], RawRecord::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut records = Vec::new();
    for raw in raws {
      let record = raw.into_record()?;
      if query.matches(&record) {
        records.push(record);
        if query.limit.is_some_and(|limit| records.len() >= limit) {
          break;
        }
      }
    }
    Ok(records)
  }

  async fn resolve_ref(&self, xml_id: &str) -> Result<Option<Record>> {
    let xml_id = xml_id.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT r.record_id, r.model, r.fields_json
               FROM refs x
               JOIN records r ON r.record_id = x.record_id
               WHERE x.xml_id = ?1",
              rusqlite::params![xml_id],
              RawRecord::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawRecord::into_record).transpose()
  }

  async fn create(&self, model: &str, fields: FieldMap) -> Result<Record> {
    let model_str = model.to_owned();
    let fields_json = encode_fields(&fields)?;
    let now = encode_dt(Utc::now());
    let link_fields = fields.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        if !model_exists(conn, &model_str)? {
          return Ok(Err(Refused::UnknownModel));
        }
        if let Some(id) = first_dangling(conn, &link_fields)? {
          return Ok(Err(Refused::Dangling(id)));
        }

        let sp = conn.savepoint()?;
        sp.execute(
          "INSERT INTO records (model, fields_json, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?3)",
          rusqlite::params![model_str, fields_json, now],
        )?;
        let id = sp.last_insert_rowid();
        sync_links(&sp, id, &link_fields)?;
        sp.commit()?;
        Ok(Ok(id))
      })
      .await?;

    match outcome {
      Ok(id) => Ok(Record {
        id: RecordId(id),
        model: model.to_owned(),
        fields,
      }),
      Err(Refused::Dangling(id)) => Err(Error::DanglingReference(id)),
      Err(Refused::UnknownModel | Refused::NotFound | Refused::Corrupt(_)) => {
        Err(Error::UnknownModel(model.to_owned()))
      }
    }
  }

  async fn write(&self, model: &str, id: RecordId, fields: FieldMap) -> Result<Record> {
    let model_str = model.to_owned();
    let now = encode_dt(Utc::now());

    let outcome = self
      .conn
      .call(move |conn| {
        let Some(raw) = select_record(conn, &model_str, id.0)? else {
          return Ok(Err(Refused::NotFound));
        };
        if let Some(missing) = first_dangling(conn, &fields)? {
          return Ok(Err(Refused::Dangling(missing)));
        }

        // Merge on this thread so the read and the write see the same row.
        let mut merged = match decode_fields(&raw.fields_json) {
          Ok(current) => current,
          Err(e) => return Ok(Err(Refused::Corrupt(e.to_string()))),
        };
        merged.extend(fields.clone());
        let merged_json = match encode_fields(&merged) {
          Ok(json) => json,
          Err(e) => return Ok(Err(Refused::Corrupt(e.to_string()))),
        };

        let sp = conn.savepoint()?;
        sp.execute(
          "UPDATE records SET fields_json = ?1, updated_at = ?2 WHERE record_id = ?3",
          rusqlite::params![merged_json, now, id.0],
        )?;
        sync_links(&sp, id.0, &fields)?;
        sp.commit()?;
        Ok(Ok(merged))
      })
      .await?;

    match outcome {
      Ok(fields) => Ok(Record { id, model: model.to_owned(), fields }),
      Err(Refused::NotFound) => Err(Error::RecordNotFound {
        model: model.to_owned(),
        id,
      }),
      Err(Refused::Dangling(missing)) => Err(Error::DanglingReference(missing)),
      Err(Refused::Corrupt(reason)) => Err(Error::CorruptRecord { id, reason }),
      Err(Refused::UnknownModel) => Err(Error::UnknownModel(model.to_owned())),
    }
  }

  async fn unlink(&self, model: &str, id: RecordId) -> Result<Unlinked> {
    let model_str = model.to_owned();

    let outcome = self
      .conn
      .call(move |conn| {
        if select_record(conn, &model_str, id.0)?.is_none() {
          return Ok(None);
        }

        let referrer: Option<(String, i64, String)> = conn
          .query_row(
            "SELECT r.model, r.record_id, l.field
             FROM links l
             JOIN records r ON r.record_id = l.src_id
             WHERE l.dst_id = ?1
             ORDER BY r.record_id
             LIMIT 1",
            rusqlite::params![id.0],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?;
        if let Some((src_model, src_id, field)) = referrer {
          return Ok(Some(Unlinked::InUse(format!(
            "referenced by {src_model} {src_id} ({field})"
          ))));
        }

        conn.execute(
          "DELETE FROM records WHERE record_id = ?1",
          rusqlite::params![id.0],
        )?;
        Ok(Some(Unlinked::Deleted))
      })
      .await?;

    outcome.ok_or_else(|| Error::RecordNotFound {
      model: model.to_owned(),
      id,
    })
  }

  async fn begin(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn commit(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("COMMIT")?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn rollback(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch("ROLLBACK")?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
