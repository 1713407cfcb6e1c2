//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use tether_core::{Outcome, ReconcileError};
use thiserror::Error;

/// A failed reconciliation, rendered as its status object.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub ReconcileError);

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = StatusCode::from_u16(self.0.status())
      .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let outcome = Outcome::from(self.0);
    (status, Json(outcome)).into_response()
  }
}
