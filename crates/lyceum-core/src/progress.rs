//! Mastery and spaced-repetition state — one row per (user, KC) and
//! (user, ALO) respectively, created lazily and updated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default mastery for a (user, KC) pair with no recorded attempts.
pub const DEFAULT_THETA: f64 = 0.5;

/// SM-2 starting easiness factor.
pub const DEFAULT_EASINESS: f64 = 2.5;

/// SM-2 floor for the easiness factor.
pub const MIN_EASINESS: f64 = 1.3;

// ─── Mastery ─────────────────────────────────────────────────────────────────

/// Scalar mastery estimate for one user on one knowledge component.
/// `theta` is always clamped to `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasteryEstimate {
  pub user_id:        Uuid,
  pub kc_id:          Uuid,
  pub theta:          f64,
  pub attempts_count: u32,
  pub correct_count:  u32,
  pub updated_at:     DateTime<Utc>,
}

impl MasteryEstimate {
  /// A fresh estimate at the uninformed prior.
  pub fn new(user_id: Uuid, kc_id: Uuid, at: DateTime<Utc>) -> Self {
    Self {
      user_id,
      kc_id,
      theta: DEFAULT_THETA,
      attempts_count: 0,
      correct_count: 0,
      updated_at: at,
    }
  }
}

// ─── Review queue ────────────────────────────────────────────────────────────

/// Per-user, per-ALO spaced-repetition timing state (SM-2).
/// `easiness` never drops below [`MIN_EASINESS`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewQueueItem {
  pub user_id:       Uuid,
  pub alo_id:        Uuid,
  pub next_due:      DateTime<Utc>,
  pub interval_days: u32,
  pub easiness:      f64,
  pub reps:          u32,
  pub updated_at:    DateTime<Utc>,
}

impl ReviewQueueItem {
  /// A fresh item: one-day interval, due tomorrow, no successful reps yet.
  pub fn new(user_id: Uuid, alo_id: Uuid, now: DateTime<Utc>) -> Self {
    Self {
      user_id,
      alo_id,
      next_due: now + chrono::Duration::days(1),
      interval_days: 1,
      easiness: DEFAULT_EASINESS,
      reps: 0,
      updated_at: now,
    }
  }
}
