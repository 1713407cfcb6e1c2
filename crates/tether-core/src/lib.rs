//! Core types and trait definitions for Tether.
//!
//! Tether maps an identity authenticated by a hosted identity provider onto
//! exactly one local user record. This crate holds the domain types, the
//! storage and identity-provider abstractions, and the reconciliation action
//! itself. It is deliberately free of HTTP and database dependencies.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod identity;
pub mod provider;
pub mod reconcile;
pub mod store;
pub mod user;

pub use error::{InvalidIdentity, ReconcileError, Result};
pub use reconcile::{Outcome, Reconciled, Reconciler, reconcile};
