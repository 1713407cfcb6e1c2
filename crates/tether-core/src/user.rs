//! Local user — the application's own record for an external identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::InvalidIdentity, identity::ExternalIdentity};

/// A persisted user. Created once per external id and never rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalUser {
  pub id:            Uuid,
  pub external_id:   String,
  pub email:         String,
  pub name:          String,
  pub profile_image: String,
  pub created_at:    DateTime<Utc>,
}

/// Insert payload for [`UserStore::create_user`](crate::store::UserStore::create_user).
/// The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocalUser {
  pub external_id:   String,
  pub email:         String,
  pub name:          String,
  pub profile_image: String,
}

impl NewLocalUser {
  /// Derive the insert payload from an identity.
  ///
  /// The email check here is separate from the list-emptiness check done
  /// before the store lookup: the first email record may itself carry an
  /// empty address.
  pub fn derive(identity: &ExternalIdentity) -> Result<Self, InvalidIdentity> {
    let email = identity.primary_email().unwrap_or_default();
    let name = identity.display_name();
    let profile_image = identity.profile_image();

    if email.is_empty() {
      return Err(InvalidIdentity::EmptyEmail);
    }

    Ok(Self {
      external_id: identity.id.clone(),
      email: email.to_owned(),
      name,
      profile_image,
    })
  }
}
