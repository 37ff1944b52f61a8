//! Error type for `lyceum-engine`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum EngineError {
  /// A compile request or assembled plan failed validation. Carries the
  /// full message list; nothing was persisted.
  #[error("validation failed: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("course not found: {0}")]
  CourseNotFound(Uuid),

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("alo not found: {0}")]
  AloNotFound(Uuid),

  #[error("learning objective not found: {0}")]
  LoNotFound(Uuid),

  /// The prerequisite graph reachable from the plan contains a cycle.
  #[error("prerequisite cycle detected among knowledge components")]
  PrerequisiteCycle,

  /// The course schedule has no ALOs to present.
  #[error("course {0} has an empty schedule")]
  EmptySchedule(Uuid),

  #[error("store error: {0}")]
  Store(Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
  /// Wrap a store backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
