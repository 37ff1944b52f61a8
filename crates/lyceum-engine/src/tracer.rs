//! Knowledge tracing — per-(user, KC) mastery estimates.
//!
//! A deliberately simple exponentially-decaying-learning-rate tracker, not
//! full Bayesian Knowledge Tracing: deterministic given its inputs, which
//! keeps the policy engine testable.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lyceum_core::{
  progress::{DEFAULT_THETA, MasteryEstimate},
  store::LearningStore,
};
use uuid::Uuid;

use crate::{EngineError, Result};

const BASE_LEARNING_RATE: f64 = 0.3;

/// The core update rule. `attempts_count` is the count *after* this attempt
/// has been added.
fn next_theta(
  old_theta: f64,
  attempts_count: u32,
  correct: bool,
  difficulty: i8,
) -> f64 {
  let learning_rate =
    BASE_LEARNING_RATE / (1.0 + 0.1 * f64::from(attempts_count));
  // difficulty in [-2, 2] maps to a factor in [0.6, 1.4]: harder items
  // move the estimate more.
  let difficulty_factor = 1.0 + f64::from(difficulty) * 0.2;
  let outcome = if correct { 1.0 } else { 0.0 };

  let delta = learning_rate * (outcome - old_theta) * difficulty_factor;
  (old_theta + delta).clamp(0.0, 1.0)
}

/// Apply one attempt outcome to the mastery estimate for `(user_id, kc_id)`,
/// creating it lazily at the uninformed prior. Returns the new theta.
pub async fn update_theta<S: LearningStore>(
  store: &S,
  user_id: Uuid,
  kc_id: Uuid,
  correct: bool,
  difficulty: i8,
  now: DateTime<Utc>,
) -> Result<f64> {
  let mut estimate = store
    .get_mastery(user_id, kc_id)
    .await
    .map_err(EngineError::store)?
    .unwrap_or_else(|| MasteryEstimate::new(user_id, kc_id, now));

  estimate.attempts_count += 1;
  if correct {
    estimate.correct_count += 1;
  }

  let old_theta = estimate.theta;
  estimate.theta =
    next_theta(old_theta, estimate.attempts_count, correct, difficulty);
  estimate.updated_at = now;

  store
    .put_mastery(estimate.clone())
    .await
    .map_err(EngineError::store)?;

  tracing::debug!(
    %kc_id,
    old = old_theta,
    new = estimate.theta,
    correct,
    difficulty,
    "theta updated"
  );

  Ok(estimate.theta)
}

/// Current theta for one KC; the uninformed prior when no estimate exists.
pub async fn get_theta<S: LearningStore>(
  store: &S,
  user_id: Uuid,
  kc_id: Uuid,
) -> Result<f64> {
  Ok(
    store
      .get_mastery(user_id, kc_id)
      .await
      .map_err(EngineError::store)?
      .map(|m| m.theta)
      .unwrap_or(DEFAULT_THETA),
  )
}

/// All theta values recorded for a user, keyed by KC id.
pub async fn get_all_theta<S: LearningStore>(
  store: &S,
  user_id: Uuid,
) -> Result<HashMap<Uuid, f64>> {
  Ok(
    store
      .list_mastery(user_id)
      .await
      .map_err(EngineError::store)?
      .into_iter()
      .map(|m| (m.kc_id, m.theta))
      .collect(),
  )
}
