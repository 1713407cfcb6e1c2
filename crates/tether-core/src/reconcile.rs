//! The user reconciliation action.
//!
//! Given an authenticated [`ExternalIdentity`], make sure exactly one
//! [`LocalUser`] exists for it and return that user. Existing users are
//! returned untouched; unseen identities get a record derived from their
//! profile fields.
//!
//! Every path ends in a value: faults from the store or the identity provider
//! are logged and folded into [`ReconcileError::Unknown`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
  error::{InvalidIdentity, ReconcileError},
  identity::ExternalIdentity,
  provider::IdentityProvider,
  store::{UserStore, UserStoreError},
  user::{LocalUser, NewLocalUser},
};

// ─── Success ─────────────────────────────────────────────────────────────────

/// Successful reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
  /// A user already existed for the external id.
  Existing(LocalUser),
  /// A user was created by this call.
  Created(LocalUser),
}

impl Reconciled {
  pub fn status(&self) -> u16 {
    match self {
      Reconciled::Existing(_) => 200,
      Reconciled::Created(_) => 201,
    }
  }

  pub fn user(&self) -> &LocalUser {
    match self {
      Reconciled::Existing(user) | Reconciled::Created(user) => user,
    }
  }

  pub fn into_user(self) -> LocalUser {
    match self {
      Reconciled::Existing(user) | Reconciled::Created(user) => user,
    }
  }

  pub fn is_created(&self) -> bool { matches!(self, Reconciled::Created(_)) }
}

// ─── Plain status object ─────────────────────────────────────────────────────

/// Flattened, serialisable form of a reconciliation result:
/// `{status, user}` on success, `{status, message}` on failure, plus
/// `error: "Internal Server Error"` for unexpected faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
  pub status:  u16,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user:    Option<LocalUser>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

impl From<Reconciled> for Outcome {
  fn from(reconciled: Reconciled) -> Self {
    Outcome {
      status:  reconciled.status(),
      user:    Some(reconciled.into_user()),
      error:   None,
      message: None,
    }
  }
}

impl From<ReconcileError> for Outcome {
  fn from(err: ReconcileError) -> Self {
    Outcome {
      status:  err.status(),
      user:    None,
      error:   matches!(err, ReconcileError::Unknown(_))
        .then(|| "Internal Server Error".to_owned()),
      message: Some(err.to_string()),
    }
  }
}

impl From<Result<Reconciled, ReconcileError>> for Outcome {
  fn from(result: Result<Reconciled, ReconcileError>) -> Self {
    match result {
      Ok(reconciled) => reconciled.into(),
      Err(err) => err.into(),
    }
  }
}

// ─── Action ──────────────────────────────────────────────────────────────────

/// Find or create the local user for `identity`.
///
/// `None` means the caller has no authenticated identity. The store is only
/// reached once the identity carries an id and at least one email record.
pub async fn reconcile<S>(
  store: &S,
  identity: Option<&ExternalIdentity>,
) -> Result<Reconciled, ReconcileError>
where
  S: UserStore,
{
  let Some(identity) = identity else {
    tracing::debug!("no authenticated identity");
    return Err(ReconcileError::Unauthenticated);
  };

  if identity.id.is_empty() {
    return Err(InvalidIdentity::MissingId.into());
  }
  if identity.email_addresses.is_empty() {
    return Err(InvalidIdentity::NoEmailAddresses.into());
  }

  let external_id = identity.id.as_str();

  if let Some(user) = store
    .find_by_external_id(external_id)
    .await
    .map_err(fault)?
  {
    tracing::debug!(external_id, user_id = %user.id, "found existing user");
    return Ok(Reconciled::Existing(user));
  }

  let new_user = NewLocalUser::derive(identity)?;

  match store.create_user(new_user).await {
    Ok(Some(user)) => {
      tracing::info!(external_id, user_id = %user.id, "created user");
      Ok(Reconciled::Created(user))
    }
    Ok(None) => {
      tracing::error!(external_id, "store returned no record for new user");
      Err(ReconcileError::StoreFailure)
    }
    Err(err) if err.is_unique_violation() => {
      // Lost a race with a concurrent first-time reconciliation.
      tracing::warn!(external_id, "user created concurrently, re-reading");
      match store
        .find_by_external_id(external_id)
        .await
        .map_err(fault)?
      {
        Some(user) => Ok(Reconciled::Existing(user)),
        None => Err(fault(err)),
      }
    }
    Err(err) => Err(fault(err)),
  }
}

/// Log `err` and convert it into [`ReconcileError::Unknown`].
fn fault<E: std::error::Error>(err: E) -> ReconcileError {
  tracing::error!(error = %err, "user reconciliation failed");
  ReconcileError::unknown(err.to_string())
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// Binds an [`IdentityProvider`] to a [`UserStore`] so request handlers can
/// reconcile straight from a credential.
///
/// Cloning is cheap: both halves are reference-counted.
pub struct Reconciler<P, S> {
  provider: Arc<P>,
  store:    Arc<S>,
}

impl<P, S> Clone for Reconciler<P, S> {
  fn clone(&self) -> Self {
    Self {
      provider: Arc::clone(&self.provider),
      store:    Arc::clone(&self.store),
    }
  }
}

impl<P, S> Reconciler<P, S>
where
  P: IdentityProvider,
  S: UserStore,
{
  pub fn new(provider: Arc<P>, store: Arc<S>) -> Self {
    Self { provider, store }
  }

  pub fn provider(&self) -> &P { &self.provider }

  pub fn store(&self) -> &S { &self.store }

  /// Resolve `credential` through the provider, then [`reconcile`].
  ///
  /// A missing or empty credential is treated as unauthenticated without
  /// contacting the provider.
  pub async fn reconcile_token(
    &self,
    credential: Option<&str>,
  ) -> Result<Reconciled, ReconcileError> {
    let Some(credential) = credential.filter(|c| !c.is_empty()) else {
      return Err(ReconcileError::Unauthenticated);
    };

    let identity = self
      .provider
      .current_identity(credential)
      .await
      .map_err(fault)?;

    reconcile(self.store.as_ref(), identity.as_ref()).await
  }
}

#[cfg(test)]
mod tests {
  use std::{
    collections::HashMap,
    sync::{
      Mutex,
      atomic::{AtomicUsize, Ordering},
    },
  };

  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  // ─── Test doubles ──────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  enum MemError {
    #[error("{0}")]
    Failed(String),
    #[error("duplicate external id")]
    Duplicate,
  }

  impl UserStoreError for MemError {
    fn is_unique_violation(&self) -> bool { matches!(self, MemError::Duplicate) }
  }

  #[derive(Default)]
  enum CreateMode {
    #[default]
    Insert,
    ReturnNone,
    Fail(&'static str),
    /// Another writer inserts the same external id just before us.
    LoseRace,
  }

  #[derive(Default)]
  struct MemoryStore {
    users:       Mutex<HashMap<String, LocalUser>>,
    lookups:     AtomicUsize,
    create_mode: CreateMode,
    fail_lookup: Option<&'static str>,
  }

  impl MemoryStore {
    fn with_mode(create_mode: CreateMode) -> Self {
      Self {
        create_mode,
        ..Self::default()
      }
    }

    fn materialise(input: NewLocalUser) -> LocalUser {
      LocalUser {
        id:            Uuid::new_v4(),
        external_id:   input.external_id,
        email:         input.email,
        name:          input.name,
        profile_image: input.profile_image,
        created_at:    Utc::now(),
      }
    }

    fn insert(&self, input: NewLocalUser) -> Result<LocalUser, MemError> {
      let mut users = self.users.lock().unwrap();
      if users.contains_key(&input.external_id) {
        return Err(MemError::Duplicate);
      }
      let user = Self::materialise(input);
      users.insert(user.external_id.clone(), user.clone());
      Ok(user)
    }

    fn count(&self) -> usize { self.users.lock().unwrap().len() }
  }

  impl UserStore for MemoryStore {
    type Error = MemError;

    async fn find_by_external_id(
      &self,
      external_id: &str,
    ) -> Result<Option<LocalUser>, MemError> {
      self.lookups.fetch_add(1, Ordering::SeqCst);
      if let Some(message) = self.fail_lookup {
        return Err(MemError::Failed(message.into()));
      }
      Ok(self.users.lock().unwrap().get(external_id).cloned())
    }

    async fn create_user(
      &self,
      input: NewLocalUser,
    ) -> Result<Option<LocalUser>, MemError> {
      match self.create_mode {
        CreateMode::Insert => self.insert(input).map(Some),
        CreateMode::ReturnNone => Ok(None),
        CreateMode::Fail(message) => Err(MemError::Failed(message.into())),
        CreateMode::LoseRace => {
          self.insert(NewLocalUser {
            name: "Racer".into(),
            ..input.clone()
          })?;
          self.insert(input).map(Some)
        }
      }
    }
  }

  #[derive(Debug, thiserror::Error)]
  #[error("{0}")]
  struct ProviderError(String);

  /// Resolves the token `"good"` to a fixed identity, fails on `"broken"`.
  struct FixedProvider {
    identity: ExternalIdentity,
    calls:    AtomicUsize,
  }

  impl IdentityProvider for FixedProvider {
    type Error = ProviderError;

    async fn current_identity(
      &self,
      credential: &str,
    ) -> Result<Option<ExternalIdentity>, ProviderError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match credential {
        "good" => Ok(Some(self.identity.clone())),
        "broken" => Err(ProviderError("provider unreachable".into())),
        _ => Ok(None),
      }
    }
  }

  fn alice() -> ExternalIdentity {
    ExternalIdentity::new("user_alice").with_email("alice@example.com")
  }

  // ─── reconcile ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn no_identity_is_unauthenticated() {
    let store = MemoryStore::default();
    let result = reconcile(&store, None).await;
    assert_eq!(result, Err(ReconcileError::Unauthenticated));
    assert_eq!(Outcome::from(result).status, 403);
  }

  #[tokio::test]
  async fn missing_id_never_reaches_store() {
    let store = MemoryStore::default();
    let identity = ExternalIdentity::new("").with_email("alice@example.com");

    let result = reconcile(&store, Some(&identity)).await;
    assert_eq!(result, Err(InvalidIdentity::MissingId.into()));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn no_email_addresses_is_invalid() {
    let store = MemoryStore::default();
    let identity = ExternalIdentity::new("user_alice").with_name("Alice", "A");

    let result = reconcile(&store, Some(&identity)).await;
    assert_eq!(result, Err(InvalidIdentity::NoEmailAddresses.into()));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn empty_first_address_is_invalid_after_lookup() {
    let store = MemoryStore::default();
    let identity = ExternalIdentity::new("user_alice").with_email("");

    let result = reconcile(&store, Some(&identity)).await;
    assert_eq!(result, Err(InvalidIdentity::EmptyEmail.into()));
    assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    assert_eq!(store.count(), 0);
  }

  #[tokio::test]
  async fn creates_then_finds() {
    let store = MemoryStore::default();
    let identity = alice();

    let first = reconcile(&store, Some(&identity)).await.unwrap();
    assert_eq!(first.status(), 201);
    assert!(first.is_created());

    let second = reconcile(&store, Some(&identity)).await.unwrap();
    assert_eq!(second.status(), 200);
    assert_eq!(second.user().id, first.user().id);
    assert_eq!(second.user().external_id, "user_alice");
    assert_eq!(second.user().email, "alice@example.com");
    assert_eq!(store.count(), 1);
  }

  #[tokio::test]
  async fn existing_user_is_not_rewritten() {
    let store = MemoryStore::default();
    reconcile(&store, Some(&alice())).await.unwrap();

    let renamed = alice()
      .with_name("Alice", "Liddell")
      .with_image("https://img.example/alice.png");
    let user = reconcile(&store, Some(&renamed)).await.unwrap().into_user();
    assert_eq!(user.name, "alice");
    assert_eq!(user.profile_image, "");
  }

  #[tokio::test]
  async fn name_derived_from_email_when_names_blank() {
    let store = MemoryStore::default();
    let identity = alice().with_name("", "");
    let user = reconcile(&store, Some(&identity)).await.unwrap().into_user();
    assert_eq!(user.name, "alice");
    assert_eq!(user.profile_image, "");
  }

  #[tokio::test]
  async fn name_from_first_and_last() {
    let store = MemoryStore::default();
    let identity = ExternalIdentity::new("user_jane")
      .with_email("someone.else@example.com")
      .with_name("Jane", "Doe")
      .with_image("https://img.example/jane.png");
    let user = reconcile(&store, Some(&identity)).await.unwrap().into_user();
    assert_eq!(user.name, "Jane Doe");
    assert_eq!(user.profile_image, "https://img.example/jane.png");
  }

  #[tokio::test]
  async fn create_returning_nothing_is_store_failure() {
    let store = MemoryStore::with_mode(CreateMode::ReturnNone);
    let outcome = Outcome::from(reconcile(&store, Some(&alice())).await);
    assert_eq!(outcome.status, 500);
    assert_eq!(outcome.message.as_deref(), Some("Failed to create user"));
    assert_eq!(outcome.error, None);
  }

  #[tokio::test]
  async fn create_fault_carries_message() {
    let store = MemoryStore::with_mode(CreateMode::Fail("disk I/O error"));
    let result = reconcile(&store, Some(&alice())).await;
    assert_eq!(result, Err(ReconcileError::Unknown("disk I/O error".into())));

    let outcome = Outcome::from(result);
    assert_eq!(outcome.status, 500);
    assert_eq!(outcome.error.as_deref(), Some("Internal Server Error"));
    assert_eq!(outcome.message.as_deref(), Some("disk I/O error"));
  }

  #[tokio::test]
  async fn lookup_fault_is_unknown() {
    let store = MemoryStore {
      fail_lookup: Some("connection reset"),
      ..MemoryStore::default()
    };
    let result = reconcile(&store, Some(&alice())).await;
    assert_eq!(result, Err(ReconcileError::Unknown("connection reset".into())));
  }

  #[tokio::test]
  async fn fault_without_message_uses_fallback() {
    let store = MemoryStore::with_mode(CreateMode::Fail(""));
    let result = reconcile(&store, Some(&alice())).await;
    assert_eq!(result, Err(ReconcileError::Unknown("Unknown error".into())));
  }

  #[tokio::test]
  async fn lost_race_returns_winner() {
    let store = MemoryStore::with_mode(CreateMode::LoseRace);
    let result = reconcile(&store, Some(&alice())).await.unwrap();
    assert_eq!(result.status(), 200);
    assert_eq!(result.user().name, "Racer");
    assert_eq!(store.count(), 1);
    assert_eq!(store.lookups.load(Ordering::SeqCst), 2);
  }

  // ─── Reconciler ────────────────────────────────────────────────────────────

  fn reconciler() -> Reconciler<FixedProvider, MemoryStore> {
    Reconciler::new(
      Arc::new(FixedProvider {
        identity: alice(),
        calls:    AtomicUsize::new(0),
      }),
      Arc::new(MemoryStore::default()),
    )
  }

  #[tokio::test]
  async fn missing_credential_skips_provider() {
    let r = reconciler();
    assert_eq!(
      r.reconcile_token(None).await,
      Err(ReconcileError::Unauthenticated)
    );
    assert_eq!(
      r.reconcile_token(Some("")).await,
      Err(ReconcileError::Unauthenticated)
    );
    assert_eq!(r.provider().calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn unknown_credential_is_unauthenticated() {
    let r = reconciler();
    assert_eq!(
      r.reconcile_token(Some("stale")).await,
      Err(ReconcileError::Unauthenticated)
    );
  }

  #[tokio::test]
  async fn provider_fault_is_unknown() {
    let r = reconciler();
    assert_eq!(
      r.reconcile_token(Some("broken")).await,
      Err(ReconcileError::Unknown("provider unreachable".into()))
    );
    assert_eq!(r.store().lookups.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn valid_credential_creates_then_finds() {
    let r = reconciler();
    let first = r.reconcile_token(Some("good")).await.unwrap();
    let second = r.clone().reconcile_token(Some("good")).await.unwrap();
    assert_eq!(first.status(), 201);
    assert_eq!(second.status(), 200);
    assert_eq!(first.user(), second.user());
  }

  #[tokio::test]
  async fn null_provider_fields_are_bad_requests() {
    let cases = [
      (
        r#"{"id": null, "email_addresses": [{"email_address": "a@example.com"}]}"#,
        InvalidIdentity::MissingId,
      ),
      (
        r#"{"id": "user_alice", "email_addresses": null}"#,
        InvalidIdentity::NoEmailAddresses,
      ),
      (
        r#"{"id": "user_alice", "email_addresses": [{"email_address": null}]}"#,
        InvalidIdentity::EmptyEmail,
      ),
    ];

    for (json, expected) in cases {
      let store = MemoryStore::default();
      let identity: ExternalIdentity = serde_json::from_str(json).unwrap();
      let result = reconcile(&store, Some(&identity)).await;
      assert_eq!(result, Err(expected.into()), "{json}");
      assert_eq!(Outcome::from(result).status, 400);
      assert_eq!(store.count(), 0);
    }
  }

  // ─── Outcome ───────────────────────────────────────────────────────────────

  #[test]
  fn outcome_json_shapes() {
    let invalid =
      Outcome::from(ReconcileError::from(InvalidIdentity::MissingId));
    assert_eq!(
      serde_json::to_value(&invalid).unwrap(),
      serde_json::json!({ "status": 400, "message": "Invalid user ID" })
    );

    let forbidden = Outcome::from(ReconcileError::Unauthenticated);
    assert_eq!(
      serde_json::to_value(&forbidden).unwrap(),
      serde_json::json!({ "status": 403, "message": "No user found" })
    );
  }
}
