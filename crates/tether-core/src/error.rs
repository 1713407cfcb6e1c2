//! Error types for `tether-core`.
//!
//! [`ReconcileError`] is a closed set: callers branch on the variant (or on
//! [`ReconcileError::status`]) rather than on message text.

use thiserror::Error;

/// Why an authenticated identity cannot be turned into a local user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidIdentity {
  #[error("Invalid user ID")]
  MissingId,

  #[error("No email address found")]
  NoEmailAddresses,

  /// The first email record is present but its address is empty.
  #[error("Email address is required")]
  EmptyEmail,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
  /// No authenticated identity accompanied the request.
  #[error("No user found")]
  Unauthenticated,

  #[error(transparent)]
  InvalidInput(#[from] InvalidIdentity),

  /// The store accepted the insert but handed back no record.
  #[error("Failed to create user")]
  StoreFailure,

  /// Any other fault raised by the store or the identity provider.
  #[error("{0}")]
  Unknown(String),
}

impl ReconcileError {
  /// Wrap an arbitrary fault message, falling back to `"Unknown error"` when
  /// the fault carries none.
  pub fn unknown(message: impl Into<String>) -> Self {
    let message = message.into();
    if message.trim().is_empty() {
      ReconcileError::Unknown("Unknown error".to_owned())
    } else {
      ReconcileError::Unknown(message)
    }
  }

  /// Advisory status code for this failure.
  pub fn status(&self) -> u16 {
    match self {
      ReconcileError::Unauthenticated => 403,
      ReconcileError::InvalidInput(_) => 400,
      ReconcileError::StoreFailure | ReconcileError::Unknown(_) => 500,
    }
  }
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;
