//! Error type for `tether-store-sqlite`.

use tether_core::store::UserStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Insert rejected by the `UNIQUE (external_id)` constraint.
  #[error("user with external id {0:?} already exists")]
  Conflict(String),
}

impl UserStoreError for Error {
  fn is_unique_violation(&self) -> bool { matches!(self, Error::Conflict(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
