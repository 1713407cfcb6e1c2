//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, UUIDs as hyphenated lowercase
//! strings.

use chrono::{DateTime, Utc};
use tether_core::user::LocalUser;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ──────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Rows ─────────────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`], for `SELECT` and `RETURNING`.
pub const USER_COLUMNS: &str =
  "id, external_id, email, name, profile_image, created_at";

/// A `users` row as read from SQLite, before parsing.
#[derive(Debug)]
pub struct RawUser {
  pub id:            String,
  pub external_id:   String,
  pub email:         String,
  pub name:          String,
  pub profile_image: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      external_id:   row.get(1)?,
      email:         row.get(2)?,
      name:          row.get(3)?,
      profile_image: row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn decode(self) -> Result<LocalUser> {
    Ok(LocalUser {
      id:            decode_uuid(&self.id)?,
      external_id:   self.external_id,
      email:         self.email,
      name:          self.name,
      profile_image: self.profile_image,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
