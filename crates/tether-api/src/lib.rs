//! HTTP surface for Tether.
//!
//! Exposes an axum [`Router`] that runs the user reconciliation action for
//! the caller's session. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(tether_api::api_router(reconciler.clone()))
//! ```

pub mod auth;
pub mod error;
pub mod session;

use axum::{
  Router,
  routing::{get, post},
};
use tether_core::{Reconciler, provider::IdentityProvider, store::UserStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Build the API router for `reconciler`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<P, S>(reconciler: Reconciler<P, S>) -> Router<()>
where
  P: IdentityProvider + 'static,
  S: UserStore + 'static,
{
  Router::new()
    .route("/auth/reconcile", post(auth::reconcile::<P, S>))
    .route("/health", get(health))
    .layer(TraceLayer::new_for_http())
    .with_state(reconciler)
}

async fn health() -> &'static str { "ok" }
