//! [`StaticIdentityProvider`] — a fixed token → identity table.

use std::{collections::HashMap, convert::Infallible};

use tether_core::{identity::ExternalIdentity, provider::IdentityProvider};

#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
  identities: HashMap<String, ExternalIdentity>,
}

impl StaticIdentityProvider {
  pub fn new() -> Self { Self::default() }

  /// Register `identity` as the owner of `token`.
  pub fn with_identity(
    mut self,
    token: impl Into<String>,
    identity: ExternalIdentity,
  ) -> Self {
    self.identities.insert(token.into(), identity);
    self
  }
}

impl IdentityProvider for StaticIdentityProvider {
  type Error = Infallible;

  async fn current_identity(
    &self,
    credential: &str,
  ) -> Result<Option<ExternalIdentity>, Infallible> {
    Ok(self.identities.get(credential).cloned())
  }
}
