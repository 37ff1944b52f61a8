//! Caller identity extraction.
//!
//! Authentication proper is a gateway concern; by the time a request reaches
//! this service the authenticated user id arrives as the opaque `x-user-id`
//! header. A missing or non-UUID value is rejected with 401.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user, extracted from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

impl<S> FromRequestParts<S> for UserId
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .headers
      .get(USER_ID_HEADER)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| Uuid::parse_str(value).ok())
      .map(UserId)
      .ok_or(ApiError::Unauthorized)
  }
}
