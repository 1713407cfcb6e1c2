//! [`SqliteUserStore`] — the SQLite implementation of [`UserStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tether_core::{
  store::UserStore,
  user::{LocalUser, NewLocalUser},
};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawUser, USER_COLUMNS, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tether user store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteUserStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteUserStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
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

  /// Number of stored users.
  pub async fn count(&self) -> Result<usize> {
    let n = self
      .conn
      .call(|conn| {
        let n: usize =
          conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        Ok(n)
      })
      .await?;
    Ok(n)
  }
}

/// `true` if `err` is SQLite rejecting a row under a `UNIQUE` constraint.
fn is_unique_violation(err: &tokio_rusqlite::Error) -> bool {
  matches!(
    err,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
      if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

// ─── UserStore impl ──────────────────────────────────────────────────────────

impl UserStore for SqliteUserStore {
  type Error = Error;

  async fn find_by_external_id(
    &self,
    external_id: &str,
  ) -> Result<Option<LocalUser>> {
    let external_id = external_id.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE external_id = ?1"),
            rusqlite::params![external_id],
            RawUser::from_row,
          )
          .optional()?;
        Ok(row)
      })
      .await?;

    raw.map(RawUser::decode).transpose()
  }

  async fn create_user(&self, input: NewLocalUser) -> Result<Option<LocalUser>> {
    let id_str      = encode_uuid(Uuid::new_v4());
    let at_str      = encode_dt(Utc::now());
    let external_id = input.external_id.clone();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        let row = conn
          .query_row(
            &format!(
              "INSERT INTO users (
                 id, external_id, email, name, profile_image, created_at
               ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               RETURNING {USER_COLUMNS}"
            ),
            rusqlite::params![
              id_str,
              input.external_id,
              input.email,
              input.name,
              input.profile_image,
              at_str,
            ],
            RawUser::from_row,
          )
          .optional()?;
        Ok(row)
      })
      .await
      .map_err(|e| {
        if is_unique_violation(&e) {
          tracing::debug!(
            external_id = %external_id,
            "insert rejected by unique constraint"
          );
          Error::Conflict(external_id)
        } else {
          Error::Database(e)
        }
      })?;

    raw.map(RawUser::decode).transpose()
  }
}
