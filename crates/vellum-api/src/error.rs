//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error kind maps to a stable status code; the body is always
//! `{ "error": string, "details"?: string }`. Unexpected failures become a
//! generic 500 with a best-effort message, never a stack of internals.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;
use vellum_core::{actor::AuthError, rate_limit::RateLimitExceeded};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("unauthorized")]
  Unauthorized,

  /// Authenticated but not scoped to a tenant (code `tenant_missing`).
  #[error("tenant_missing")]
  TenantMissing,

  /// Authenticated but the role is not allowed (code `forbidden`).
  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("rate limited, retry after {retry_after}")]
  RateLimited { retry_after: DateTime<Utc> },

  #[error("internal error: {0}")]
  Internal(String),
}

impl From<vellum_core::Error> for ApiError {
  fn from(e: vellum_core::Error) -> Self {
    use vellum_core::Error as E;
    match e {
      E::Validation(msg) => ApiError::Validation(msg),
      E::DocumentNotFound(_) | E::VersionNotFound(_) => {
        ApiError::NotFound(e.to_string())
      }
      E::InvalidTransition { .. }
      | E::AlreadySuperseded(_)
      | E::PublishConflict(_) => ApiError::Conflict(e.to_string()),
      E::Serialization(_) | E::Storage(_) => ApiError::Internal(e.to_string()),
    }
  }
}

impl From<AuthError> for ApiError {
  fn from(e: AuthError) -> Self {
    match e {
      AuthError::Unauthorized => ApiError::Unauthorized,
      AuthError::TenantMissing => ApiError::TenantMissing,
      AuthError::Forbidden => ApiError::Forbidden,
    }
  }
}

impl From<RateLimitExceeded> for ApiError {
  fn from(e: RateLimitExceeded) -> Self {
    ApiError::RateLimited { retry_after: e.retry_after }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, error, details) = match &self {
      ApiError::Validation(m) => {
        (StatusCode::BAD_REQUEST, "validation_failed", Some(m.clone()))
      }
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
      ApiError::TenantMissing => {
        (StatusCode::FORBIDDEN, "tenant_missing", None)
      }
      ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", None),
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, "not_found", Some(m.clone()))
      }
      ApiError::Conflict(m) => {
        (StatusCode::CONFLICT, "conflict", Some(m.clone()))
      }
      ApiError::RateLimited { retry_after } => (
        StatusCode::TOO_MANY_REQUESTS,
        "rate_limited",
        Some(format!("retry after {retry_after}")),
      ),
      ApiError::Internal(m) => {
        (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", Some(m.clone()))
      }
    };

    let body = match details {
      Some(d) => json!({ "error": error, "details": d }),
      None => json!({ "error": error }),
    };
    (status, Json(body)).into_response()
  }
}
