//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lyceum_engine::EngineError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Compile-request validation failures. Every message is reported, not
  /// just the first.
  #[error("validation failed: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("missing or invalid x-user-id header")]
  Unauthorized,

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match &self {
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, json!({ "error": m }))
      }
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, json!({ "error": m }))
      }
      ApiError::Validation(messages) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": "validation failed", "messages": messages }),
      ),
      ApiError::Unauthorized => (
        StatusCode::UNAUTHORIZED,
        json!({ "error": self.to_string() }),
      ),
      // Internal details are logged, never sent to the client.
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "internal error" }),
        )
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          json!({ "error": "internal error" }),
        )
      }
    };
    (status, Json(body)).into_response()
  }
}

impl From<EngineError> for ApiError {
  fn from(err: EngineError) -> Self {
    match err {
      EngineError::Validation(messages) => Self::Validation(messages),
      e @ (EngineError::CourseNotFound(_)
      | EngineError::SessionNotFound(_)
      | EngineError::AloNotFound(_)
      | EngineError::LoNotFound(_)) => Self::NotFound(e.to_string()),
      e @ EngineError::EmptySchedule(_) => Self::BadRequest(e.to_string()),
      e @ EngineError::PrerequisiteCycle => Self::Internal(e.to_string()),
      EngineError::Store(source) => Self::Store(source),
    }
  }
}
