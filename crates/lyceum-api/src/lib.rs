//! JSON + WebSocket API for Lyceum.
//!
//! Exposes an axum [`Router`] backed by any
//! [`lyceum_core::store::LearningStore`]. Authentication proper, TLS, and
//! transport concerns belong to the gateway in front of this service; the
//! authenticated user id arrives as the `x-user-id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lyceum_api::api_router(store.clone()))
//! ```

pub mod courses;
pub mod error;
pub mod evidence;
pub mod identity;
pub mod progress;
pub mod sessions;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch, post},
};
use lyceum_core::store::LearningStore;
use serde::Deserialize;

pub use error::ApiError;
pub use identity::UserId;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` (or the
/// `LYCEUM_*` environment).
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: LearningStore + 'static,
{
  Router::new()
    // Courses
    .route("/courses/compile", post(courses::compile::<S>))
    .route("/courses", get(courses::list::<S>))
    .route("/courses/{id}/plan", get(courses::plan::<S>))
    .route("/courses/{id}/status", patch(courses::set_status::<S>))
    .route("/courses/{id}", delete(courses::delete_one::<S>))
    // Sessions
    .route("/sessions", post(sessions::create::<S>))
    .route("/sessions/{id}", get(sessions::get_one::<S>))
    .route("/sessions/{id}/run", get(sessions::run::<S>))
    // Evidence
    .route("/evidence/submit", post(evidence::submit::<S>))
    .route("/evidence/{alo_id}/requirements", get(evidence::requirements::<S>))
    // Progress
    .route("/progress", get(progress::overview::<S>))
    .route("/progress/mastery", get(progress::mastery::<S>))
    .route("/progress/reviews/due", get(progress::due_reviews::<S>))
    .route("/progress/reviews/upcoming", get(progress::upcoming_reviews::<S>))
    .route("/progress/stats", get(progress::stats::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
