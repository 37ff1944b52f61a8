//! The session runner — a transport-free state machine driving one live
//! learning session. The API layer owns the actual WebSocket and feeds
//! decoded signals in; the runner owns turn sequencing, attempt recording,
//! and idempotent session ending.
//!
//! One runner per connection; turns are strictly sequential within it.

use chrono::{DateTime, Utc};
use lyceum_core::{
  catalog::Alo,
  course::Course,
  session::{NewAttempt, Session, SignalEvent},
  store::LearningStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Result, policy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
  Running,
  Ended,
}

/// One inbound client signal, already decoded from the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct Signal {
  pub alo_id:     Uuid,
  pub event:      SignalEvent,
  #[serde(default)]
  pub correct:    Option<bool>,
  #[serde(default)]
  pub latency_ms: Option<u32>,
  #[serde(default)]
  pub hints_used: u32,
  #[serde(default)]
  pub payload:    Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
  pub total_attempts:   u32,
  pub correct_count:    u32,
  pub accuracy_percent: f64,
  pub time_spent_min:   u32,
}

/// What the transport should send next: another ALO, or the end-of-session
/// summary.
#[derive(Debug)]
pub enum Turn {
  Present(Box<Alo>),
  End(SessionSummary),
}

#[derive(Debug)]
pub struct SessionRunner<'s, S> {
  store:          &'s S,
  user_id:        Uuid,
  session:        Session,
  course:         Course,
  current_alo_id: Option<Uuid>,
  state:          RunnerState,
}

impl<'s, S: LearningStore> SessionRunner<'s, S> {
  /// Load the session and course and derive the opening turn from stored
  /// state: a due review preempts, a session with prior attempts resumes
  /// after its most recent attempt, and a fresh session starts at the first
  /// scheduled ALO.
  pub async fn begin(
    store: &'s S,
    session_id: Uuid,
    user_id: Uuid,
    now: DateTime<Utc>,
  ) -> Result<(Self, Turn)> {
    let session = store
      .get_session(session_id)
      .await
      .map_err(EngineError::store)?
      .ok_or(EngineError::SessionNotFound(session_id))?;
    let course = store
      .get_course(session.course_id)
      .await
      .map_err(EngineError::store)?
      .ok_or(EngineError::CourseNotFound(session.course_id))?;

    let mut runner = Self {
      store,
      user_id,
      session,
      course,
      current_alo_id: None,
      state: RunnerState::Running,
    };

    let due = store
      .due_reviews(user_id, now)
      .await
      .map_err(EngineError::store)?;
    if let Some(review) = due.first() {
      let turn = runner.present(review.alo_id).await?;
      return Ok((runner, turn));
    }

    let attempts = store
      .list_attempts(session_id)
      .await
      .map_err(EngineError::store)?;
    if let Some(last) = attempts.last() {
      // Resuming: the attempt was already applied to mastery, so pick up
      // right after it rather than restarting.
      return match runner.course.next_scheduled_alo(last.alo_id) {
        Some(next) => {
          let turn = runner.present(next).await?;
          Ok((runner, turn))
        }
        None => {
          let summary = runner.summarize(now).await?;
          runner.finish(now).await?;
          Ok((runner, Turn::End(summary)))
        }
      };
    }

    match runner.course.first_scheduled_alo() {
      Some(first) => {
        let turn = runner.present(first).await?;
        Ok((runner, turn))
      }
      None => Err(EngineError::EmptySchedule(runner.course.course_id)),
    }
  }

  pub fn session_id(&self) -> Uuid { self.session.session_id }

  pub fn state(&self) -> RunnerState { self.state }

  /// Record the attempt, run the policy, and produce the next turn.
  pub async fn handle_signal(
    &mut self,
    signal: Signal,
    now: DateTime<Utc>,
  ) -> Result<Turn> {
    self
      .store
      .record_attempt(NewAttempt {
        session_id: self.session.session_id,
        alo_id:     signal.alo_id,
        event_time: now,
        correct:    signal.correct,
        latency_ms: signal.latency_ms,
        hints_used: signal.hints_used,
        payload:    signal.payload,
      })
      .await
      .map_err(EngineError::store)?;

    let decision = policy::decide(
      self.store,
      self.user_id,
      &self.course,
      signal.alo_id,
      &policy::AttemptOutcome {
        correct:    signal.correct,
        hints_used: signal.hints_used,
        latency_ms: signal.latency_ms,
      },
      now,
    )
    .await?;

    tracing::debug!(
      session_id = %self.session.session_id,
      action = ?decision.action,
      reason = decision.reason,
      "turn decided"
    );

    match decision.alo_id {
      Some(next) => self.present(next).await,
      None => {
        let summary = self.summarize(now).await?;
        self.finish(now).await?;
        Ok(Turn::End(summary))
      }
    }
  }

  /// Mark the session ended. Safe to call more than once; only the first
  /// call writes the end timestamp.
  pub async fn finish(&mut self, now: DateTime<Utc>) -> Result<()> {
    let transitioned = self
      .store
      .end_session(self.session.session_id, now)
      .await
      .map_err(EngineError::store)?;
    if transitioned {
      tracing::info!(session_id = %self.session.session_id, "session ended");
    }
    self.state = RunnerState::Ended;
    Ok(())
  }

  async fn present(&mut self, alo_id: Uuid) -> Result<Turn> {
    let alo = self
      .store
      .get_alo(alo_id)
      .await
      .map_err(EngineError::store)?
      .ok_or(EngineError::AloNotFound(alo_id))?;
    self.current_alo_id = Some(alo_id);
    Ok(Turn::Present(Box::new(alo)))
  }

  async fn summarize(&self, now: DateTime<Utc>) -> Result<SessionSummary> {
    let attempts = self
      .store
      .list_attempts(self.session.session_id)
      .await
      .map_err(EngineError::store)?;

    let total_attempts = attempts.len() as u32;
    let correct_count =
      attempts.iter().filter(|a| a.correct == Some(true)).count() as u32;
    let accuracy = if total_attempts > 0 {
      f64::from(correct_count) / f64::from(total_attempts) * 100.0
    } else {
      0.0
    };

    let elapsed = now - self.session.started_at;
    let time_spent_min = elapsed.num_minutes().max(0) as u32;

    Ok(SessionSummary {
      total_attempts,
      correct_count,
      accuracy_percent: (accuracy * 10.0).round() / 10.0,
      time_spent_min,
    })
  }
}
