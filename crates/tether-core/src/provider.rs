//! The `IdentityProvider` trait.
//!
//! The provider owns authentication; Tether only asks it who a credential
//! belongs to. Token validation happens on the provider's side.

use std::future::Future;

use crate::identity::ExternalIdentity;

pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve `credential` (typically a session token) to the identity it
  /// authenticates. Returns `None` when the credential authenticates nobody.
  fn current_identity<'a>(
    &'a self,
    credential: &'a str,
  ) -> impl Future<Output = Result<Option<ExternalIdentity>, Self::Error>> + Send + 'a;
}
