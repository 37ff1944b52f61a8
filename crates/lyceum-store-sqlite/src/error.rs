//! Error type for `lyceum-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lyceum_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown enum value in column {column}: {value:?}")]
  UnknownEnumValue { column: &'static str, value: String },

  #[error("duplicate knowledge component slug: {0:?}")]
  DuplicateSlug(String),

  #[error("duplicate prerequisite edge: {kc_id} -> {prereq_kc_id}")]
  DuplicatePrerequisite {
    kc_id:        uuid::Uuid,
    prereq_kc_id: uuid::Uuid,
  },

  #[error("course not found: {0}")]
  CourseNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
