//! Handlers for `/sessions` endpoints, including the live WebSocket run.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sessions` | Body: `{"course_id":"…"}`, 201 |
//! | `GET`  | `/sessions/:id` | Metadata plus attempt counts |
//! | `GET`  | `/sessions/:id/run` | WebSocket upgrade |
//!
//! # Wire protocol
//!
//! Server→client: `{"type":"alo","alo":{…}}` then, once the policy decides
//! the course is done, `{"type":"end","summary":{…}}`. Client→server:
//! `{"type":"signal","alo_id":…,"event":…,…}`. Malformed inbound JSON gets
//! `{"error":"invalid message format"}` and the loop keeps reading; a
//! disconnect or internal error ends the session best-effort (ending is
//! idempotent, so a crossed wire never double-ends).

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, State,
    ws::{Message, WebSocket, WebSocketUpgrade},
  },
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use lyceum_core::{
  catalog::{Alo, AloType},
  session::SessionStatus,
  store::LearningStore,
};
use lyceum_engine::runner::{
  RunnerState, SessionRunner, SessionSummary, Signal, Turn,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::courses::owned_course;
use crate::error::ApiError;
use crate::identity::UserId;

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub course_id: Uuid,
}

/// `POST /sessions` — body: `{"course_id":"…"}`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: LearningStore,
{
  owned_course(store.as_ref(), user_id, body.course_id).await?;
  let session = store
    .create_session(body.course_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::info!(session_id = %session.session_id, course_id = %body.course_id, "session created");
  Ok((StatusCode::CREATED, Json(session)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SessionDetail {
  pub session_id:     Uuid,
  pub course_id:      Uuid,
  pub started_at:     DateTime<Utc>,
  pub ended_at:       Option<DateTime<Utc>>,
  pub status:         SessionStatus,
  pub attempts_count: u32,
  pub correct_count:  u32,
}

/// Load a session and verify the owning course belongs to `user_id`.
async fn owned_session<S>(
  store: &S,
  user_id: Uuid,
  session_id: Uuid,
) -> Result<lyceum_core::session::Session, ApiError>
where
  S: LearningStore,
{
  let session = store
    .get_session(session_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("session {session_id} not found"))
    })?;
  // Ownership is carried by the course; a foreign session reads as missing.
  owned_course(store, user_id, session.course_id)
    .await
    .map_err(|_| ApiError::NotFound(format!("session {session_id} not found")))?;
  Ok(session)
}

/// `GET /sessions/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Path(session_id): Path<Uuid>,
) -> Result<Json<SessionDetail>, ApiError>
where
  S: LearningStore,
{
  let session = owned_session(store.as_ref(), user_id, session_id).await?;
  let attempts = store
    .list_attempts(session_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(SessionDetail {
    session_id:     session.session_id,
    course_id:      session.course_id,
    started_at:     session.started_at,
    ended_at:       session.ended_at,
    status:         session.status,
    attempts_count: attempts.len() as u32,
    correct_count:  attempts.iter().filter(|a| a.correct == Some(true)).count()
      as u32,
  }))
}

// ─── Live run ─────────────────────────────────────────────────────────────────

/// The ALO payload as sent over the wire.
#[derive(Debug, Serialize)]
struct AloView {
  id:              Uuid,
  alo_type:        AloType,
  content:         serde_json::Value,
  assessment_spec: Option<serde_json::Value>,
  difficulty:      i8,
  est_time_sec:    u32,
}

impl From<&Alo> for AloView {
  fn from(alo: &Alo) -> Self {
    Self {
      id:              alo.alo_id,
      alo_type:        alo.alo_type(),
      content:         alo.content.to_json().unwrap_or(serde_json::Value::Null),
      assessment_spec: alo.assessment_spec.clone(),
      difficulty:      alo.difficulty,
      est_time_sec:    alo.est_time_sec,
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ServerMessage {
  Alo { alo: AloView },
  End { summary: SessionSummary },
}

impl From<&Turn> for ServerMessage {
  fn from(turn: &Turn) -> Self {
    match turn {
      Turn::Present(alo) => Self::Alo {
        alo: AloView::from(alo.as_ref()),
      },
      Turn::End(summary) => Self::End {
        summary: summary.clone(),
      },
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ClientMessage {
  Signal(Signal),
}

/// `GET /sessions/:id/run` — WebSocket upgrade.
///
/// Ownership is checked before the upgrade so a foreign session is a plain
/// 404, never an open socket.
pub async fn run<S>(
  ws: WebSocketUpgrade,
  State(store): State<Arc<S>>,
  UserId(user_id): UserId,
  Path(session_id): Path<Uuid>,
) -> Result<Response, ApiError>
where
  S: LearningStore + 'static,
{
  owned_session(store.as_ref(), user_id, session_id).await?;
  Ok(ws.on_upgrade(move |socket| {
    run_session(socket, store, session_id, user_id)
  }))
}

/// Serialise and send one outbound message. Returns `false` once the peer
/// is gone.
async fn send_json<T: Serialize>(socket: &mut WebSocket, value: &T) -> bool {
  match serde_json::to_string(value) {
    Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
    Err(error) => {
      tracing::error!(%error, "failed to encode outbound message");
      false
    }
  }
}

async fn send_error(socket: &mut WebSocket, message: &str) -> bool {
  send_json(socket, &serde_json::json!({ "error": message })).await
}

/// Drive one connected session: present a turn, await a signal, repeat.
/// Strictly sequential — one outstanding turn per connection.
async fn run_session<S>(
  mut socket: WebSocket,
  store: Arc<S>,
  session_id: Uuid,
  user_id: Uuid,
) where
  S: LearningStore,
{
  let (mut runner, opening) =
    match SessionRunner::begin(store.as_ref(), session_id, user_id, Utc::now())
      .await
    {
      Ok(opened) => opened,
      Err(error) => {
        tracing::error!(%session_id, %error, "failed to start session run");
        send_error(&mut socket, "internal error").await;
        return;
      }
    };

  let mut live = send_json(&mut socket, &ServerMessage::from(&opening)).await
    && matches!(opening, Turn::Present(_));

  while live {
    let Some(inbound) = socket.recv().await else {
      break;
    };
    let text = match inbound {
      Ok(Message::Text(text)) => text,
      Ok(Message::Close(_)) | Err(_) => break,
      // Pings and pongs are handled by axum; ignore binary frames.
      Ok(_) => continue,
    };

    let ClientMessage::Signal(signal) = match serde_json::from_str(&text) {
      Ok(message) => message,
      Err(error) => {
        tracing::warn!(%session_id, %error, "malformed signal");
        if !send_error(&mut socket, "invalid message format").await {
          break;
        }
        continue;
      }
    };

    match runner.handle_signal(signal, Utc::now()).await {
      Ok(turn) => {
        live = send_json(&mut socket, &ServerMessage::from(&turn)).await
          && matches!(turn, Turn::Present(_));
      }
      Err(error) => {
        tracing::error!(%session_id, %error, "session turn failed");
        send_error(&mut socket, "internal error").await;
        break;
      }
    }
  }

  // Best-effort end on disconnect or error; a normal completion has
  // already ended the session inside the runner.
  if runner.state() == RunnerState::Running
    && let Err(error) = runner.finish(Utc::now()).await
  {
    tracing::warn!(%session_id, %error, "failed to end session");
  }
}
