//! SQL schema for the Tether SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per external identity. Rows are inserted once and never updated.
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    external_id   TEXT NOT NULL,
    email         TEXT NOT NULL,
    name          TEXT NOT NULL,
    profile_image TEXT NOT NULL DEFAULT '',
    created_at    TEXT NOT NULL,   -- ISO 8601 UTC; store-assigned
    UNIQUE (external_id)
);

PRAGMA user_version = 1;
";
