//! The next-unit decision core.
//!
//! A fixed-priority rule list, stateless between calls — everything it needs
//! lives in the mastery estimates, the review queue, and the course's frozen
//! schedule. Ties and gaps (e.g. no easier sibling to remediate with) fall
//! through to the next rule rather than erroring.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lyceum_core::{catalog::Alo, course::Course, store::LearningStore};
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Result, tracer};

/// Latency above this marks an attempt as struggling.
const SLOW_RESPONSE_MS: u32 = 120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
  Advance,
  Remediate,
  Review,
  Complete,
}

#[derive(Debug, Clone, Serialize)]
pub struct PolicyDecision {
  pub action:        PolicyAction,
  /// The ALO to present next; `None` only for [`PolicyAction::Complete`].
  pub alo_id:        Option<Uuid>,
  pub reason:        &'static str,
  /// Theta deltas applied while making this decision, for client display.
  pub theta_updates: HashMap<Uuid, f64>,
}

/// The performance signals from the attempt being decided on.
#[derive(Debug, Clone, Copy)]
pub struct AttemptOutcome {
  /// `None` for ALO types without a binary outcome.
  pub correct:    Option<bool>,
  pub hints_used: u32,
  pub latency_ms: Option<u32>,
}

fn should_remediate(outcome: &AttemptOutcome) -> bool {
  outcome.correct == Some(false)
    || outcome.hints_used > 2
    || outcome.latency_ms.is_some_and(|l| l > SLOW_RESPONSE_MS)
}

/// The closest strictly-easier sibling in the same LO, if any.
/// `siblings` is expected in ascending difficulty order.
fn remediation_target(siblings: &[Alo], last: &Alo) -> Option<Uuid> {
  siblings
    .iter()
    .filter(|a| a.difficulty < last.difficulty && a.alo_id != last.alo_id)
    .next_back()
    .map(|a| a.alo_id)
}

/// Decide what to present after an attempt on `last_alo_id`.
///
/// Rule order: theta update (bookkeeping, not a rule), due review, then
/// remediation, then schedule advance, else complete.
pub async fn decide<S: LearningStore>(
  store: &S,
  user_id: Uuid,
  course: &Course,
  last_alo_id: Uuid,
  outcome: &AttemptOutcome,
  now: DateTime<Utc>,
) -> Result<PolicyDecision> {
  let last_alo = store
    .get_alo(last_alo_id)
    .await
    .map_err(EngineError::store)?;

  let mut theta_updates = HashMap::new();
  if let (Some(alo), Some(correct)) = (&last_alo, outcome.correct) {
    if let Some(lo) = store.get_lo(alo.lo_id).await.map_err(EngineError::store)?
    {
      let new_theta = tracer::update_theta(
        store,
        user_id,
        lo.kc_id,
        correct,
        alo.difficulty,
        now,
      )
      .await?;
      theta_updates.insert(lo.kc_id, new_theta);
    }
  }

  // Reviews always preempt normal progression.
  let due = store
    .due_reviews(user_id, now)
    .await
    .map_err(EngineError::store)?;
  if let Some(review) = due.first() {
    tracing::debug!(alo_id = %review.alo_id, "due review preempts");
    return Ok(PolicyDecision {
      action: PolicyAction::Review,
      alo_id: Some(review.alo_id),
      reason: "spaced review due",
      theta_updates,
    });
  }

  if should_remediate(outcome) {
    if let Some(alo) = &last_alo {
      let siblings = store
        .list_alos_for_los(&[alo.lo_id])
        .await
        .map_err(EngineError::store)?;
      if let Some(target) = remediation_target(&siblings, alo) {
        tracing::debug!(alo_id = %target, "remediating");
        return Ok(PolicyDecision {
          action: PolicyAction::Remediate,
          alo_id: Some(target),
          reason: "performance indicates need for reinforcement",
          theta_updates,
        });
      }
    }
  }

  if let Some(next) = course.next_scheduled_alo(last_alo_id) {
    return Ok(PolicyDecision {
      action: PolicyAction::Advance,
      alo_id: Some(next),
      reason: "ready for the next learning objective",
      theta_updates,
    });
  }

  Ok(PolicyDecision {
    action: PolicyAction::Complete,
    alo_id: None,
    reason: "all learning objectives completed",
    theta_updates,
  })
}
