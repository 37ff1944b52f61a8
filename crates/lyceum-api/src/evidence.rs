//! Handlers for `/evidence` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/evidence/submit` | Grade artifacts + checks against an ALO |
//! | `GET`  | `/evidence/:alo_id/requirements` | What a submission must show |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::Utc;
use lyceum_core::{catalog::AloType, store::LearningStore};
use lyceum_engine::assess::{self, CheckResult, EvidenceOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::UserId;

// ─── Submit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub alo_id:    Uuid,
  #[serde(default)]
  pub artifacts: Vec<serde_json::Value>,
  #[serde(default)]
  pub checks:    Vec<CheckResult>,
}

/// `POST /evidence/submit`
pub async fn submit<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Json(body): Json<SubmitBody>,
) -> Result<Json<EvidenceOutcome>, ApiError>
where
  S: LearningStore,
{
  let outcome = assess::submit_evidence(
    store.as_ref(),
    user_id,
    body.alo_id,
    &body.artifacts,
    &body.checks,
    Utc::now(),
  )
  .await?;
  Ok(Json(outcome))
}

// ─── Requirements ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AloRequirements {
  pub alo_id:             Uuid,
  pub alo_type:           AloType,
  pub assessment_spec:    Option<serde_json::Value>,
  pub difficulty:         i8,
  pub estimated_time_sec: u32,
}

/// `GET /evidence/:alo_id/requirements`
pub async fn requirements<S>(
  State(store): State<Arc<S>>,
  UserId(_user_id): UserId,
  Path(alo_id): Path<Uuid>,
) -> Result<Json<AloRequirements>, ApiError>
where
  S: LearningStore,
{
  let alo = store
    .get_alo(alo_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("alo {alo_id} not found")))?;

  Ok(Json(AloRequirements {
    alo_id:             alo.alo_id,
    alo_type:           alo.alo_type(),
    assessment_spec:    alo.assessment_spec,
    difficulty:         alo.difficulty,
    estimated_time_sec: alo.est_time_sec,
  }))
}
