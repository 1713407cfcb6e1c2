//! Session credential extraction.
//!
//! The credential is an opaque token handed on to the identity provider. It
//! is read from `Authorization: Bearer <token>`, falling back to the
//! provider's session cookie.

use axum::http::{HeaderMap, header};

/// Name of the cookie carrying the provider's session token.
pub const SESSION_COOKIE: &str = "__session";

/// Return the session token carried by `headers`, if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
  bearer_token(headers).or_else(|| cookie_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split_once(' '))
    .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
    .map(|(_, token)| token.trim())
    .filter(|t| !t.is_empty())
}

fn cookie_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .map(|(_, value)| value)
    .filter(|t| !t.is_empty())
}
