//! External identity — the authenticated user as the identity provider sees
//! it.
//!
//! Tether never persists this type; it is read on every reconciliation and
//! only its derived fields end up in a [`LocalUser`](crate::user::LocalUser).
//! The field names follow the provider's snake_case JSON so the HTTP client
//! can deserialise responses directly.

use serde::{Deserialize, Deserializer, Serialize};

/// One entry of an identity's email address list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailAddress {
  /// Provider-side identifier of the email record, when supplied.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:            Option<String>,
  #[serde(deserialize_with = "null_as_default")]
  pub email_address: String,
}

impl EmailAddress {
  pub fn new(address: impl Into<String>) -> Self {
    Self {
      id:            None,
      email_address: address.into(),
    }
  }
}

/// The identity provider's record for the currently authenticated user.
///
/// Missing or `null` JSON fields deserialise to empty values; an empty `id`
/// is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalIdentity {
  #[serde(deserialize_with = "null_as_default")]
  pub id:              String,
  #[serde(deserialize_with = "null_as_default")]
  pub email_addresses: Vec<EmailAddress>,
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub image_url:       Option<String>,
}

/// Read an explicit `null` as the field's empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExternalIdentity {
  pub fn new(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..Self::default()
    }
  }

  pub fn with_email(mut self, address: impl Into<String>) -> Self {
    self.email_addresses.push(EmailAddress::new(address));
    self
  }

  pub fn with_name(
    mut self,
    first: impl Into<String>,
    last: impl Into<String>,
  ) -> Self {
    self.first_name = Some(first.into());
    self.last_name = Some(last.into());
    self
  }

  pub fn with_image(mut self, url: impl Into<String>) -> Self {
    self.image_url = Some(url.into());
    self
  }

  /// The address of the first email record, if any.
  pub fn primary_email(&self) -> Option<&str> {
    self
      .email_addresses
      .first()
      .map(|e| e.email_address.as_str())
  }

  /// Display name: `"<first> <last>"` trimmed, else the local part of the
  /// primary email, else `"User"`.
  pub fn display_name(&self) -> String {
    let first = self.first_name.as_deref().unwrap_or_default();
    let last = self.last_name.as_deref().unwrap_or_default();
    let full = format!("{first} {last}");
    let full = full.trim();
    if !full.is_empty() {
      return full.to_owned();
    }

    self
      .primary_email()
      .and_then(|email| email.split('@').next())
      .filter(|local| !local.is_empty())
      .unwrap_or("User")
      .to_owned()
  }

  /// Profile image URL, or an empty string when the provider has none.
  pub fn profile_image(&self) -> String {
    self.image_url.clone().unwrap_or_default()
  }
}
