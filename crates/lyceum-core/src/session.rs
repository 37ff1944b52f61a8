//! Session and attempt types — the telemetry side of a live run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Session ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
  Active,
  Ended,
}

/// One run of a course over a live connection. Ended exactly once, on
/// normal completion, disconnect, or internal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
  pub session_id: Uuid,
  pub course_id:  Uuid,
  pub started_at: DateTime<Utc>,
  pub ended_at:   Option<DateTime<Utc>>,
  pub status:     SessionStatus,
}

// ─── Attempt ─────────────────────────────────────────────────────────────────

/// The signal event reported by the client for an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalEvent {
  Answered,
  Completed,
  Skipped,
  HelpRequested,
}

/// An immutable telemetry record of one user interaction with one ALO
/// within one session. Append-only; never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
  pub attempt_id: Uuid,
  pub session_id: Uuid,
  pub alo_id:     Uuid,
  pub event_time: DateTime<Utc>,
  /// `None` for ALO types with no binary outcome (explain, example).
  pub correct:    Option<bool>,
  pub latency_ms: Option<u32>,
  pub hints_used: u32,
  /// Raw client signal, kept verbatim for later analysis.
  pub payload:    Option<serde_json::Value>,
}

/// Input to [`crate::store::LearningStore::record_attempt`].
#[derive(Debug, Clone)]
pub struct NewAttempt {
  pub session_id: Uuid,
  pub alo_id:     Uuid,
  pub event_time: DateTime<Utc>,
  pub correct:    Option<bool>,
  pub latency_ms: Option<u32>,
  pub hints_used: u32,
  pub payload:    Option<serde_json::Value>,
}
