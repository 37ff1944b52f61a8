//! Handlers for `/progress` endpoints — read-only projections of mastery,
//! review, and attempt state.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/progress` | Theta-by-slug map plus the review queue |
//! | `GET` | `/progress/mastery` | Optional `?kc_slug=` |
//! | `GET` | `/progress/reviews/due` | Overdue items, earliest first |
//! | `GET` | `/progress/reviews/upcoming` | `?days_ahead=` in `1..=30` |
//! | `GET` | `/progress/stats` | Optional `?course_id=` |

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use lyceum_core::{
  course::CourseStatus, progress::ReviewQueueItem, store::LearningStore,
};
use lyceum_engine::srs;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::UserId;

const DEFAULT_DAYS_AHEAD: u32 = 7;
const MAX_DAYS_AHEAD: u32 = 30;

/// Slug lookup for every KC in the catalog.
async fn slugs_by_kc<S>(store: &S) -> Result<HashMap<Uuid, String>, ApiError>
where
  S: LearningStore,
{
  let kcs = store
    .list_kcs()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(kcs.into_iter().map(|kc| (kc.kc_id, kc.slug)).collect())
}

// ─── Overview ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProgressOverview {
  /// Current theta per KC slug. Only KCs with recorded attempts appear.
  pub mastery:          BTreeMap<String, f64>,
  pub reviews_due:      Vec<ReviewQueueItem>,
  pub reviews_upcoming: Vec<ReviewQueueItem>,
}

/// `GET /progress`
pub async fn overview<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
) -> Result<Json<ProgressOverview>, ApiError>
where
  S: LearningStore,
{
  let slugs = slugs_by_kc(store.as_ref()).await?;
  let estimates = store
    .list_mastery(user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let mastery = estimates
    .into_iter()
    .filter_map(|m| slugs.get(&m.kc_id).map(|slug| (slug.clone(), m.theta)))
    .collect();

  let now = Utc::now();
  let reviews_due = srs::due_reviews(store.as_ref(), user_id, now).await?;
  let reviews_upcoming =
    srs::upcoming_reviews(store.as_ref(), user_id, DEFAULT_DAYS_AHEAD, now)
      .await?;

  Ok(Json(ProgressOverview {
    mastery,
    reviews_due,
    reviews_upcoming,
  }))
}

// ─── Mastery ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MasteryParams {
  pub kc_slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MasteryView {
  pub kc_slug:        String,
  pub theta:          f64,
  pub attempts_count: u32,
  pub correct_count:  u32,
  pub updated_at:     DateTime<Utc>,
}

/// `GET /progress/mastery[?kc_slug=<slug>]`
pub async fn mastery<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Query(params): Query<MasteryParams>,
) -> Result<Json<Vec<MasteryView>>, ApiError>
where
  S: LearningStore,
{
  let slugs = slugs_by_kc(store.as_ref()).await?;
  if let Some(slug) = &params.kc_slug
    && !slugs.values().any(|s| s == slug)
  {
    return Err(ApiError::NotFound(format!(
      "knowledge component {slug} not found"
    )));
  }

  let estimates = store
    .list_mastery(user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let views = estimates
    .into_iter()
    .filter_map(|m| {
      let slug = slugs.get(&m.kc_id)?;
      if params.kc_slug.as_deref().is_some_and(|wanted| wanted != slug) {
        return None;
      }
      Some(MasteryView {
        kc_slug:        slug.clone(),
        theta:          m.theta,
        attempts_count: m.attempts_count,
        correct_count:  m.correct_count,
        updated_at:     m.updated_at,
      })
    })
    .collect();
  Ok(Json(views))
}

// ─── Reviews ──────────────────────────────────────────────────────────────────

/// `GET /progress/reviews/due`
pub async fn due_reviews<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
) -> Result<Json<Vec<ReviewQueueItem>>, ApiError>
where
  S: LearningStore,
{
  let due = srs::due_reviews(store.as_ref(), user_id, Utc::now()).await?;
  Ok(Json(due))
}

#[derive(Debug, Deserialize)]
pub struct UpcomingParams {
  pub days_ahead: Option<u32>,
}

/// `GET /progress/reviews/upcoming[?days_ahead=<1..=30>]`
pub async fn upcoming_reviews<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Query(params): Query<UpcomingParams>,
) -> Result<Json<Vec<ReviewQueueItem>>, ApiError>
where
  S: LearningStore,
{
  let days_ahead = params.days_ahead.unwrap_or(DEFAULT_DAYS_AHEAD);
  if !(1..=MAX_DAYS_AHEAD).contains(&days_ahead) {
    return Err(ApiError::BadRequest(format!(
      "days_ahead must be between 1 and {MAX_DAYS_AHEAD}"
    )));
  }

  let upcoming =
    srs::upcoming_reviews(store.as_ref(), user_id, days_ahead, Utc::now())
      .await?;
  Ok(Json(upcoming))
}

// ─── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatsParams {
  pub course_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct LearningStats {
  pub total_learning_time_min: u32,
  /// Distinct ALOs with at least one correct attempt.
  pub completed_alos:          u32,
  pub total_attempts:          u32,
  pub accuracy_percent:        f64,
  pub active_courses:          u32,
  pub completed_courses:       u32,
}

/// `GET /progress/stats[?course_id=<id>]`
pub async fn stats<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Query(params): Query<StatsParams>,
) -> Result<Json<LearningStats>, ApiError>
where
  S: LearningStore,
{
  let attempts = store
    .list_attempts_for_user(user_id, params.course_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let courses = store
    .list_courses(user_id, None)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let total_attempts = attempts.len() as u32;
  let correct_count =
    attempts.iter().filter(|a| a.correct == Some(true)).count() as u32;
  let accuracy = if total_attempts > 0 {
    f64::from(correct_count) / f64::from(total_attempts) * 100.0
  } else {
    0.0
  };

  let total_ms: u64 = attempts
    .iter()
    .filter_map(|a| a.latency_ms.map(u64::from))
    .sum();

  let completed_alos: HashSet<Uuid> = attempts
    .iter()
    .filter(|a| a.correct == Some(true))
    .map(|a| a.alo_id)
    .collect();

  Ok(Json(LearningStats {
    total_learning_time_min: (total_ms / 60_000) as u32,
    completed_alos: completed_alos.len() as u32,
    total_attempts,
    accuracy_percent: (accuracy * 10.0).round() / 10.0,
    active_courses: courses
      .iter()
      .filter(|c| c.status == CourseStatus::Active)
      .count() as u32,
    completed_courses: courses
      .iter()
      .filter(|c| c.status == CourseStatus::Completed)
      .count() as u32,
  }))
}
