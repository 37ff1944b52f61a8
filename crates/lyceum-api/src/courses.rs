//! Handlers for `/courses` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/courses/compile` | Compile a goal into a course, 201 |
//! | `GET`    | `/courses` | Optional `?status=active\|paused\|completed` |
//! | `GET`    | `/courses/:id/plan` | Full frozen graph + schedule |
//! | `PATCH`  | `/courses/:id/status` | Body: `{"status":"paused"}` |
//! | `DELETE` | `/courses/:id` | 204; cascades sessions and attempts |
//!
//! Courses are owner-scoped: a course belonging to another user is
//! indistinguishable from a missing one (404).

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use lyceum_core::{
  course::{Course, CourseStatus},
  store::LearningStore,
};
use lyceum_engine::compiler::{self, CompileRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::identity::UserId;

/// One row of the course list — the frozen graph is omitted; fetch the plan
/// for the full picture.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
  pub course_id:  Uuid,
  pub goal:       String,
  pub status:     CourseStatus,
  pub total_days: u32,
  pub total_alos: u32,
  pub created_at: DateTime<Utc>,
}

impl From<&Course> for CourseSummary {
  fn from(course: &Course) -> Self {
    Self {
      course_id:  course.course_id,
      goal:       course.goal.clone(),
      status:     course.status,
      total_days: course.schedule.len() as u32,
      total_alos: course.skill_graph.alos.len() as u32,
      created_at: course.created_at,
    }
  }
}

/// Load a course and verify ownership. A foreign course is reported as
/// missing.
pub(crate) async fn owned_course<S>(
  store: &S,
  user_id: Uuid,
  course_id: Uuid,
) -> Result<Course, ApiError>
where
  S: LearningStore,
{
  store
    .get_course(course_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .filter(|c| c.user_id == user_id)
    .ok_or_else(|| ApiError::NotFound(format!("course {course_id} not found")))
}

// ─── Compile ──────────────────────────────────────────────────────────────────

/// `POST /courses/compile` — body: [`CompileRequest`]
pub async fn compile<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Json(request): Json<CompileRequest>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LearningStore,
{
  let compiled = compiler::compile(store.as_ref(), user_id, &request).await?;
  Ok((StatusCode::CREATED, Json(compiled)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<CourseStatus>,
}

/// `GET /courses[?status=<status>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CourseSummary>>, ApiError>
where
  S: LearningStore,
{
  let courses = store
    .list_courses(user_id, params.status)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(courses.iter().map(CourseSummary::from).collect()))
}

// ─── Plan ─────────────────────────────────────────────────────────────────────

/// `GET /courses/:id/plan`
pub async fn plan<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Path(course_id): Path<Uuid>,
) -> Result<Json<Course>, ApiError>
where
  S: LearningStore,
{
  let course = owned_course(store.as_ref(), user_id, course_id).await?;
  Ok(Json(course))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: CourseStatus,
}

/// `PATCH /courses/:id/status` — body: `{"status":"paused"}`
pub async fn set_status<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Path(course_id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<CourseSummary>, ApiError>
where
  S: LearningStore,
{
  let mut course = owned_course(store.as_ref(), user_id, course_id).await?;
  store
    .set_course_status(course_id, body.status)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  course.status = body.status;

  tracing::info!(%course_id, status = ?body.status, "course status changed");
  Ok(Json(CourseSummary::from(&course)))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /courses/:id`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Path(course_id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: LearningStore,
{
  owned_course(store.as_ref(), user_id, course_id).await?;
  store
    .delete_course(course_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(%course_id, "course deleted");
  Ok(StatusCode::NO_CONTENT)
}
