use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use lyceum_core::catalog::{
  AloContent, ExerciseContent, ExplainContent, NewAlo, NewKnowledgeComponent,
  NewLearningObjective, QuizContent,
};
use lyceum_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;

struct SeededCatalog {
  exercise_id: Uuid,
}

/// One KC with one LO and three ALOs (explain, exercise, quiz) — enough
/// catalog for a single-day compile.
async fn seed_catalog(store: &SqliteStore) -> SeededCatalog {
  let kc = store
    .add_kc(NewKnowledgeComponent {
      slug:        "flexbox_fundamentals".into(),
      title:       "Flexbox fundamentals".into(),
      description: None,
      tags:        vec!["flexbox".into(), "css".into(), "layout".into()],
    })
    .await
    .unwrap();
  let lo = store
    .add_lo(NewLearningObjective {
      kc_id:      kc.kc_id,
      verb:       "apply".into(),
      context:    Some("build one-dimensional layouts".into()),
      difficulty: 0,
      rubric:     json!({ "criteria": ["uses flex container properties"] }),
    })
    .await
    .unwrap();

  store
    .add_alo(NewAlo {
      lo_id:           lo.lo_id,
      content:         AloContent::Explain(ExplainContent {
        markdown:   "Flexbox lays out items along a main axis.".into(),
        asset_urls: vec![],
      }),
      assessment_spec: None,
      est_time_sec:    300,
      difficulty:      -1,
      tags:            vec![],
    })
    .await
    .unwrap();
  let exercise = store
    .add_alo(NewAlo {
      lo_id:           lo.lo_id,
      content:         AloContent::Exercise(ExerciseContent {
        prompt:       "Center a div with flexbox.".into(),
        starter_code: Some(".container {}".into()),
        language:     Some("css".into()),
        hints:        vec!["try justify-content".into()],
      }),
      assessment_spec: Some(json!({ "checks": ["centered"] })),
      est_time_sec:    600,
      difficulty:      0,
      tags:            vec![],
    })
    .await
    .unwrap();
  store
    .add_alo(NewAlo {
      lo_id:           lo.lo_id,
      content:         AloContent::Quiz(QuizContent {
        question:     "Which property sets the main axis?".into(),
        choices:      vec!["flex-direction".into(), "align-items".into()],
        answer_index: 0,
        explanation:  None,
      }),
      assessment_spec: None,
      est_time_sec:    120,
      difficulty:      1,
      tags:            vec![],
    })
    .await
    .unwrap();

  SeededCatalog {
    exercise_id: exercise.alo_id,
  }
}

async fn store_with_catalog() -> (Arc<SqliteStore>, SeededCatalog) {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let catalog = seed_catalog(&store).await;
  (Arc::new(store), catalog)
}

async fn request(
  store: &Arc<SqliteStore>,
  method: &str,
  uri: &str,
  user: Option<Uuid>,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header("x-user-id", user.to_string());
  }
  let req = match body {
    Some(body) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  api_router(Arc::clone(store)).oneshot(req).await.unwrap()
}

async fn body_json(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

/// Compile a small course for `user` and return its id.
async fn compile_course(store: &Arc<SqliteStore>, user: Uuid) -> Uuid {
  let resp = request(
    store,
    "POST",
    "/courses/compile",
    Some(user),
    Some(json!({
      "goal": "learn flexbox layout basics",
      "time_budget_min_per_day": 20,
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  body["course_id"].as_str().unwrap().parse().unwrap()
}

// ── Identity ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_without_identity_are_unauthorized() {
  let (store, _) = store_with_catalog().await;

  let resp = request(&store, "GET", "/courses", None, None).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  // A non-UUID header value is just as invalid.
  let req = Request::builder()
    .method("GET")
    .uri("/courses")
    .header("x-user-id", "not-a-uuid")
    .body(Body::empty())
    .unwrap();
  let resp = api_router(Arc::clone(&store)).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ── Courses ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn compile_returns_the_created_course() {
  let (store, _) = store_with_catalog().await;
  let user = Uuid::new_v4();

  let resp = request(
    &store,
    "POST",
    "/courses/compile",
    Some(user),
    Some(json!({
      "goal": "learn flexbox layout basics",
      "time_budget_min_per_day": 20,
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let body = body_json(resp).await;
  assert!(body["course_id"].as_str().is_some());
  assert!(body["estimated_total_time_min"].as_u64().unwrap() > 0);
  assert!(!body["schedule"].as_array().unwrap().is_empty());
  assert_eq!(body["skill_graph"]["alos"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn compile_validation_failure_reports_all_messages() {
  let (store, _) = store_with_catalog().await;

  // Goal too short and budget out of range: both messages come back.
  let resp = request(
    &store,
    "POST",
    "/courses/compile",
    Some(Uuid::new_v4()),
    Some(json!({ "goal": "css", "time_budget_min_per_day": 200 })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let body = body_json(resp).await;
  assert_eq!(body["messages"].as_array().unwrap().len(), 2);

  // Nothing was persisted.
  let resp =
    request(&store, "GET", "/courses", Some(Uuid::new_v4()), None).await;
  assert!(body_json(resp).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn courses_are_owner_scoped() {
  let (store, _) = store_with_catalog().await;
  let owner = Uuid::new_v4();
  let stranger = Uuid::new_v4();
  let course_id = compile_course(&store, owner).await;

  let resp = request(&store, "GET", "/courses", Some(owner), None).await;
  assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);

  let resp = request(&store, "GET", "/courses", Some(stranger), None).await;
  assert!(body_json(resp).await.as_array().unwrap().is_empty());

  // A foreign course reads as missing, for the plan and for deletion.
  let uri = format!("/courses/{course_id}/plan");
  let resp = request(&store, "GET", &uri, Some(stranger), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  let resp = request(&store, "GET", &uri, Some(owner), None).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let uri = format!("/courses/{course_id}");
  let resp = request(&store, "DELETE", &uri, Some(stranger), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_patch_shows_up_in_filtered_lists() {
  let (store, _) = store_with_catalog().await;
  let user = Uuid::new_v4();
  let course_id = compile_course(&store, user).await;

  let resp = request(
    &store,
    "PATCH",
    &format!("/courses/{course_id}/status"),
    Some(user),
    Some(json!({ "status": "paused" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(body_json(resp).await["status"], "paused");

  let resp =
    request(&store, "GET", "/courses?status=paused", Some(user), None).await;
  assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
  let resp =
    request(&store, "GET", "/courses?status=active", Some(user), None).await;
  assert!(body_json(resp).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn delete_returns_204_and_the_course_is_gone() {
  let (store, _) = store_with_catalog().await;
  let user = Uuid::new_v4();
  let course_id = compile_course(&store, user).await;

  let uri = format!("/courses/{course_id}");
  let resp = request(&store, "DELETE", &uri, Some(user), None).await;
  assert_eq!(resp.status(), StatusCode::NO_CONTENT);

  let resp = request(
    &store,
    "GET",
    &format!("/courses/{course_id}/plan"),
    Some(user),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Sessions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn session_create_and_detail() {
  let (store, _) = store_with_catalog().await;
  let user = Uuid::new_v4();
  let course_id = compile_course(&store, user).await;

  let resp = request(
    &store,
    "POST",
    "/sessions",
    Some(user),
    Some(json!({ "course_id": course_id })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body = body_json(resp).await;
  assert_eq!(body["status"], "active");
  let session_id = body["session_id"].as_str().unwrap();

  let resp = request(
    &store,
    "GET",
    &format!("/sessions/{session_id}"),
    Some(user),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let detail = body_json(resp).await;
  assert_eq!(detail["attempts_count"], 0);
  assert_eq!(detail["correct_count"], 0);
}

#[tokio::test]
async fn session_on_a_foreign_course_is_not_found() {
  let (store, _) = store_with_catalog().await;
  let owner = Uuid::new_v4();
  let course_id = compile_course(&store, owner).await;

  let resp = request(
    &store,
    "POST",
    "/sessions",
    Some(Uuid::new_v4()),
    Some(json!({ "course_id": course_id })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Evidence ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn evidence_submission_feeds_progress() {
  let (store, catalog) = store_with_catalog().await;
  let user = Uuid::new_v4();

  let resp = request(
    &store,
    "POST",
    "/evidence/submit",
    Some(user),
    Some(json!({
      "alo_id": catalog.exercise_id,
      "checks": [{ "name": "centered", "passed": true }],
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["passed"], true);
  assert_eq!(body["theta_updated"].as_object().unwrap().len(), 1);

  let resp = request(&store, "GET", "/progress", Some(user), None).await;
  let progress = body_json(resp).await;
  assert!(progress["mastery"]["flexbox_fundamentals"].as_f64().unwrap() > 0.5);
  // The pass queued a spaced review due tomorrow.
  assert_eq!(progress["reviews_upcoming"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_evidence_does_not_pass() {
  let (store, catalog) = store_with_catalog().await;

  let resp = request(
    &store,
    "POST",
    "/evidence/submit",
    Some(Uuid::new_v4()),
    Some(json!({
      "alo_id": catalog.exercise_id,
      "checks": [{ "name": "centered", "passed": false }],
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["passed"], false);
  assert!(body["feedback"].as_str().unwrap().contains("centered"));
}

#[tokio::test]
async fn evidence_requirements_describe_the_alo() {
  let (store, catalog) = store_with_catalog().await;

  let resp = request(
    &store,
    "GET",
    &format!("/evidence/{}/requirements", catalog.exercise_id),
    Some(Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["alo_type"], "exercise");
  assert_eq!(body["estimated_time_sec"], 600);
  assert_eq!(body["difficulty"], 0);

  let resp = request(
    &store,
    "GET",
    &format!("/evidence/{}/requirements", Uuid::new_v4()),
    Some(Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upcoming_reviews_validate_days_ahead() {
  let (store, _) = store_with_catalog().await;
  let user = Uuid::new_v4();

  for bad in ["0", "31"] {
    let uri = format!("/progress/reviews/upcoming?days_ahead={bad}");
    let resp = request(&store, "GET", &uri, Some(user), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  let resp = request(
    &store,
    "GET",
    "/progress/reviews/upcoming?days_ahead=30",
    Some(user),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_mastery_slug_is_not_found() {
  let (store, _) = store_with_catalog().await;
  let resp = request(
    &store,
    "GET",
    "/progress/mastery?kc_slug=quantum_knitting",
    Some(Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_track_courses_and_attempts() {
  let (store, _) = store_with_catalog().await;
  let user = Uuid::new_v4();
  compile_course(&store, user).await;

  let resp = request(&store, "GET", "/progress/stats", Some(user), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = body_json(resp).await;
  assert_eq!(body["active_courses"], 1);
  assert_eq!(body["completed_courses"], 0);
  assert_eq!(body["total_attempts"], 0);
  assert_eq!(body["accuracy_percent"], 0.0);
}
