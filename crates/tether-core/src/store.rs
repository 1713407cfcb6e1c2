//! The `UserStore` trait.
//!
//! Implemented by storage backends (e.g. `tether-store-sqlite`). The
//! reconciliation action depends on this abstraction, not on any concrete
//! backend.

use std::future::Future;

use crate::user::{LocalUser, NewLocalUser};

/// Error type of a [`UserStore`].
pub trait UserStoreError: std::error::Error + Send + Sync + 'static {
  /// `true` when an insert was rejected because a user with the same
  /// external id already exists.
  fn is_unique_violation(&self) -> bool { false }
}

/// Abstraction over a local-user store backend.
///
/// Users are created at most once per external id and are never updated or
/// deleted through this trait. Uniqueness of `external_id` is enforced by
/// the backend, not by callers.
pub trait UserStore: Send + Sync {
  type Error: UserStoreError;

  /// Look a user up by the identity provider's id. Returns `None` if no
  /// user has been created for it yet.
  fn find_by_external_id<'a>(
    &'a self,
    external_id: &'a str,
  ) -> impl Future<Output = Result<Option<LocalUser>, Self::Error>> + Send + 'a;

  /// Persist a new user and return the stored record.
  ///
  /// `Ok(None)` means the backend accepted the call but produced no record.
  /// An existing user with the same external id must be rejected with an
  /// error whose [`UserStoreError::is_unique_violation`] is `true`.
  fn create_user(
    &self,
    input: NewLocalUser,
  ) -> impl Future<Output = Result<Option<LocalUser>, Self::Error>> + Send + '_;
}
