//! Error types for `lyceum-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("knowledge component not found: {0}")]
  KcNotFound(Uuid),

  #[error("learning objective not found: {0}")]
  LoNotFound(Uuid),

  #[error("atomic learning object not found: {0}")]
  AloNotFound(Uuid),

  #[error("course not found: {0}")]
  CourseNotFound(Uuid),

  #[error("session not found: {0}")]
  SessionNotFound(Uuid),

  #[error("duplicate knowledge component slug: {0:?}")]
  DuplicateSlug(String),

  #[error("duplicate prerequisite edge: {kc_id} -> {prereq_kc_id}")]
  DuplicatePrerequisite { kc_id: Uuid, prereq_kc_id: Uuid },

  #[error("unknown ALO type discriminant: {0:?}")]
  UnknownAloType(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
