//! SQL schema for the erpseed SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per installed record type, e.g. 'account.journal'.
CREATE TABLE IF NOT EXISTS models (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS records (
    record_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    model       TEXT NOT NULL REFERENCES models(name),
    fields_json TEXT NOT NULL,   -- JSON object: field name -> tagged value
    created_at  TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at  TEXT NOT NULL
);

-- Relation edges extracted from ref/refs/lines values.
-- A referenced record cannot be deleted while an edge points at it.
CREATE TABLE IF NOT EXISTS links (
    src_id INTEGER NOT NULL REFERENCES records(record_id) ON DELETE CASCADE,
    field  TEXT    NOT NULL,
    dst_id INTEGER NOT NULL REFERENCES records(record_id) ON DELETE RESTRICT,
    PRIMARY KEY (src_id, field, dst_id)
);

-- Named constants, e.g. 'base.group_user'.
CREATE TABLE IF NOT EXISTS refs (
    xml_id    TEXT PRIMARY KEY,
    record_id INTEGER NOT NULL REFERENCES records(record_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS records_model_idx ON records(model);
CREATE INDEX IF NOT EXISTS links_dst_idx     ON links(dst_id);

PRAGMA user_version = 1;
";
