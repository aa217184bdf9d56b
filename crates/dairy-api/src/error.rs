//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use dairy_core::{BackendError, Error};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Ledger(#[from] Error),
}

impl ApiError {
  fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Ledger(Error::Validation(_)) => StatusCode::BAD_REQUEST,
      ApiError::Ledger(Error::Auth(_)) => StatusCode::UNAUTHORIZED,
      ApiError::Ledger(Error::AccountNotFound(_)) => StatusCode::NOT_FOUND,
      ApiError::Ledger(Error::Backend(BackendError::Timeout(_))) => StatusCode::GATEWAY_TIMEOUT,
      ApiError::Ledger(Error::Backend(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use dairy_core::ValidationError;

  use super::*;

  #[test]
  fn statuses_follow_error_kind() {
    let validation = ApiError::from(Error::from(ValidationError::Missing("name")));
    assert_eq!(validation.status(), StatusCode::BAD_REQUEST);

    let timeout = ApiError::from(Error::from(BackendError::Timeout(Duration::from_secs(1))));
    assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

    assert_eq!(ApiError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
  }
}
