//! Identity-provider clients for Tether.
//!
//! [`HttpIdentityProvider`] asks a hosted provider who a session token
//! belongs to. [`StaticIdentityProvider`] serves a fixed token table, for
//! single-tenant setups and tests.

mod fixed;
mod http;

pub mod error;

pub use error::{Error, Result};
pub use fixed::StaticIdentityProvider;
pub use http::{HttpIdentityProvider, IdentityConfig};
