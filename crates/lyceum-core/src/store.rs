//! The `LearningStore` trait — the durable-store collaborator boundary.
//!
//! The trait is implemented by storage backends (e.g.
//! `lyceum-store-sqlite`). The engine and API layers depend on this
//! abstraction, not on any concrete backend. It deliberately asks for
//! nothing beyond point lookups, foreign-key joins, and set-membership
//! queries.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  catalog::{
    Alo, KnowledgeComponent, LearningObjective, NewAlo,
    NewKnowledgeComponent, NewLearningObjective, PrerequisiteEdge,
  },
  course::{Course, CourseStatus, NewCourse},
  progress::{MasteryEstimate, ReviewQueueItem},
  session::{Attempt, NewAttempt, Session},
};

pub trait LearningStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Catalog authoring ─────────────────────────────────────────────────
  // Used by seeding and tests; content authoring proper is out of scope.

  /// Persist a new knowledge component. Fails on a duplicate slug.
  fn add_kc(
    &self,
    input: NewKnowledgeComponent,
  ) -> impl Future<Output = Result<KnowledgeComponent, Self::Error>> + Send + '_;

  /// Record a directed prerequisite edge. Fails on a duplicate ordered
  /// pair. Acyclicity is *not* checked here; the graph expander verifies
  /// it at compile time.
  fn add_prerequisite(
    &self,
    edge: PrerequisiteEdge,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn add_lo(
    &self,
    input: NewLearningObjective,
  ) -> impl Future<Output = Result<LearningObjective, Self::Error>> + Send + '_;

  fn add_alo(
    &self,
    input: NewAlo,
  ) -> impl Future<Output = Result<Alo, Self::Error>> + Send + '_;

  // ── Catalog reads ─────────────────────────────────────────────────────

  fn get_kc(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<KnowledgeComponent>, Self::Error>> + Send + '_;

  fn list_kcs(
    &self,
  ) -> impl Future<Output = Result<Vec<KnowledgeComponent>, Self::Error>> + Send + '_;

  fn list_prerequisites(
    &self,
  ) -> impl Future<Output = Result<Vec<PrerequisiteEdge>, Self::Error>> + Send + '_;

  fn get_lo(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<LearningObjective>, Self::Error>> + Send + '_;

  /// All learning objectives in the catalog.
  fn list_los(
    &self,
  ) -> impl Future<Output = Result<Vec<LearningObjective>, Self::Error>> + Send + '_;

  fn get_alo(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Alo>, Self::Error>> + Send + '_;

  /// All ALOs belonging to any of `lo_ids`, ordered by
  /// `(difficulty, alo_type)` — the composition order.
  fn list_alos_for_los<'a>(
    &'a self,
    lo_ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<Alo>, Self::Error>> + Send + 'a;

  // ── Courses ───────────────────────────────────────────────────────────

  /// Persist a fully-compiled course in one transactional write.
  /// `created_at` is set by the store.
  fn create_course(
    &self,
    input: NewCourse,
  ) -> impl Future<Output = Result<Course, Self::Error>> + Send + '_;

  fn get_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Course>, Self::Error>> + Send + '_;

  /// All courses owned by `user_id`, newest first, optionally filtered by
  /// status.
  fn list_courses(
    &self,
    user_id: Uuid,
    status: Option<CourseStatus>,
  ) -> impl Future<Output = Result<Vec<Course>, Self::Error>> + Send + '_;

  /// Update the only mutable course field. Returns the course not-found
  /// error if `id` is unknown.
  fn set_course_status(
    &self,
    id: Uuid,
    status: CourseStatus,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a course and its sessions/attempts.
  fn delete_course(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Sessions ──────────────────────────────────────────────────────────

  fn create_session(
    &self,
    course_id: Uuid,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  fn get_session(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// All sessions for courses owned by `user_id`.
  fn list_sessions_for_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Session>, Self::Error>> + Send + '_;

  /// Mark a session ended with timestamp `at`. Idempotent: returns `true`
  /// if the row transitioned from active to ended, `false` if it was
  /// already ended. A second end timestamp is never written.
  fn end_session(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Attempts — append-only writes ─────────────────────────────────────

  fn record_attempt(
    &self,
    input: NewAttempt,
  ) -> impl Future<Output = Result<Attempt, Self::Error>> + Send + '_;

  /// All attempts for one session, in event order.
  fn list_attempts(
    &self,
    session_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Attempt>, Self::Error>> + Send + '_;

  /// All attempts by `user_id` across all their sessions, in event order,
  /// optionally restricted to one course.
  fn list_attempts_for_user(
    &self,
    user_id: Uuid,
    course_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Attempt>, Self::Error>> + Send + '_;

  // ── Mastery estimates ─────────────────────────────────────────────────

  fn get_mastery(
    &self,
    user_id: Uuid,
    kc_id: Uuid,
  ) -> impl Future<Output = Result<Option<MasteryEstimate>, Self::Error>> + Send + '_;

  fn list_mastery(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<MasteryEstimate>, Self::Error>> + Send + '_;

  /// Insert or update the one row for `(user_id, kc_id)`.
  fn put_mastery(
    &self,
    estimate: MasteryEstimate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Review queue ──────────────────────────────────────────────────────

  fn get_review_item(
    &self,
    user_id: Uuid,
    alo_id: Uuid,
  ) -> impl Future<Output = Result<Option<ReviewQueueItem>, Self::Error>> + Send + '_;

  /// Insert or update the one row for `(user_id, alo_id)`.
  fn put_review_item(
    &self,
    item: ReviewQueueItem,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All items with `next_due <= as_of`, ascending by `next_due`.
  fn due_reviews(
    &self,
    user_id: Uuid,
    as_of: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<ReviewQueueItem>, Self::Error>> + Send + '_;

  /// All items with `next_due` in `[from, until]`, ascending by `next_due`.
  fn upcoming_reviews(
    &self,
    user_id: Uuid,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<ReviewQueueItem>, Self::Error>> + Send + '_;
}
