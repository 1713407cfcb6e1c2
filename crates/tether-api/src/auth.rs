//! Handler for `/auth/reconcile`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/reconcile` | Bearer token or `__session` cookie; 200 existing, 201 created |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
};
use tether_core::{
  Outcome, Reconciler, provider::IdentityProvider, store::UserStore,
};

use crate::{error::ApiError, session::session_token};

/// `POST /auth/reconcile`
pub async fn reconcile<P, S>(
  State(reconciler): State<Reconciler<P, S>>,
  headers: HeaderMap,
) -> Result<(StatusCode, Json<Outcome>), ApiError>
where
  P: IdentityProvider,
  S: UserStore,
{
  let reconciled = reconciler
    .reconcile_token(session_token(&headers))
    .await?;
  let status =
    StatusCode::from_u16(reconciled.status()).unwrap_or(StatusCode::OK);
  Ok((status, Json(Outcome::from(reconciled))))
}
