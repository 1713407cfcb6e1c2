//! [`HttpIdentityProvider`] — resolves session tokens over HTTP.
//!
//! The provider exposes a "current user" endpoint that answers for whoever
//! the bearer token authenticates. Tether does not inspect the token.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tether_core::{identity::ExternalIdentity, provider::IdentityProvider};

use crate::{Error, Result};

/// Connection settings for the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
  /// URL returning the identity of the bearer token's owner.
  pub user_endpoint: String,
  /// Sent as `X-Api-Key` when set.
  #[serde(default)]
  pub api_key:       Option<String>,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:  u64,
}

fn default_timeout_secs() -> u64 { 10 }

impl IdentityConfig {
  pub fn new(user_endpoint: impl Into<String>) -> Self {
    Self {
      user_endpoint: user_endpoint.into(),
      api_key:       None,
      timeout_secs:  default_timeout_secs(),
    }
  }
}

/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpIdentityProvider {
  client: Client,
  config: IdentityConfig,
}

impl HttpIdentityProvider {
  pub fn new(config: IdentityConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &IdentityConfig { &self.config }
}

impl IdentityProvider for HttpIdentityProvider {
  type Error = Error;

  async fn current_identity(
    &self,
    credential: &str,
  ) -> Result<Option<ExternalIdentity>> {
    let mut req = self
      .client
      .get(&self.config.user_endpoint)
      .bearer_auth(credential);
    if let Some(key) = &self.config.api_key {
      req = req.header("X-Api-Key", key);
    }

    let resp = req.send().await?;
    let status = resp.status();

    match status {
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
        tracing::debug!(%status, "identity provider rejected credential");
        return Ok(None);
      }
      s if s.is_success() => {}
      s => return Err(Error::UnexpectedStatus(s.as_u16())),
    }

    let body = resp.bytes().await?;
    let identity: ExternalIdentity = serde_json::from_slice(&body)?;
    Ok(Some(identity))
  }
}
