//! Spaced-repetition scheduling — classic SM-2 over [`ReviewQueueItem`]s.
//!
//! `now` is always an explicit argument so interval arithmetic is
//! deterministic under test.

use chrono::{DateTime, Duration, Utc};
use lyceum_core::{
  progress::{MIN_EASINESS, ReviewQueueItem},
  store::LearningStore,
};
use uuid::Uuid;

use crate::{EngineError, Result};

/// Apply one graded review (`quality` in 0..=5) to an item in place.
/// Quality below 3 is a failed recall and resets the progression.
fn apply_quality(item: &mut ReviewQueueItem, quality: u8, now: DateTime<Utc>) {
  let q = f64::from(quality.min(5));

  let easiness =
    item.easiness + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
  item.easiness = easiness.max(MIN_EASINESS);

  if quality < 3 {
    item.reps = 0;
    item.interval_days = 1;
  } else {
    item.reps += 1;
    item.interval_days = match item.reps {
      1 => 1,
      2 => 6,
      _ => {
        (f64::from(item.interval_days) * item.easiness).ceil() as u32
      }
    };
  }

  item.next_due = now + Duration::days(i64::from(item.interval_days));
  item.updated_at = now;
}

/// Grade a review for `(user_id, alo_id)`, creating the queue item lazily on
/// first success, and persist the new timing state.
pub async fn schedule_review<S: LearningStore>(
  store: &S,
  user_id: Uuid,
  alo_id: Uuid,
  quality: u8,
  now: DateTime<Utc>,
) -> Result<ReviewQueueItem> {
  let mut item = store
    .get_review_item(user_id, alo_id)
    .await
    .map_err(EngineError::store)?
    .unwrap_or_else(|| ReviewQueueItem::new(user_id, alo_id, now));

  apply_quality(&mut item, quality, now);

  store
    .put_review_item(item.clone())
    .await
    .map_err(EngineError::store)?;

  tracing::debug!(
    %alo_id,
    quality,
    interval_days = item.interval_days,
    easiness = item.easiness,
    "review scheduled"
  );

  Ok(item)
}

/// All reviews due at or before `as_of`, earliest first.
pub async fn due_reviews<S: LearningStore>(
  store: &S,
  user_id: Uuid,
  as_of: DateTime<Utc>,
) -> Result<Vec<ReviewQueueItem>> {
  store
    .due_reviews(user_id, as_of)
    .await
    .map_err(EngineError::store)
}

/// Reviews falling due within the next `days_ahead` days.
pub async fn upcoming_reviews<S: LearningStore>(
  store: &S,
  user_id: Uuid,
  days_ahead: u32,
  now: DateTime<Utc>,
) -> Result<Vec<ReviewQueueItem>> {
  let until = now + Duration::days(i64::from(days_ahead));
  store
    .upcoming_reviews(user_id, now, until)
    .await
    .map_err(EngineError::store)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil;

  fn fresh_item(now: DateTime<Utc>) -> ReviewQueueItem {
    ReviewQueueItem::new(Uuid::new_v4(), Uuid::new_v4(), now)
  }

  #[test]
  fn perfect_reviews_grow_intervals() {
    let now = Utc::now();
    let mut item = fresh_item(now);

    apply_quality(&mut item, 5, now);
    assert_eq!((item.reps, item.interval_days), (1, 1));
    let ef_after_first = item.easiness;
    assert!(ef_after_first > 2.5);

    apply_quality(&mut item, 5, now);
    assert_eq!((item.reps, item.interval_days), (2, 6));
    assert!(item.easiness > ef_after_first);

    let ef_before_third = item.easiness;
    apply_quality(&mut item, 5, now);
    assert_eq!(item.reps, 3);
    assert_eq!(
      item.interval_days,
      (6.0 * item.easiness).ceil() as u32
    );
    assert!(item.easiness > ef_before_third);
    assert_eq!(item.next_due, now + Duration::days(i64::from(item.interval_days)));
  }

  #[test]
  fn failed_recall_resets_progression() {
    let now = Utc::now();
    let mut item = fresh_item(now);
    for _ in 0..3 {
      apply_quality(&mut item, 5, now);
    }
    assert!(item.reps >= 3);

    apply_quality(&mut item, 2, now);
    assert_eq!(item.reps, 0);
    assert_eq!(item.interval_days, 1);
    assert_eq!(item.next_due, now + Duration::days(1));
  }

  #[test]
  fn easiness_never_drops_below_floor() {
    let now = Utc::now();
    let mut item = fresh_item(now);
    for _ in 0..20 {
      apply_quality(&mut item, 0, now);
    }
    assert!((item.easiness - MIN_EASINESS).abs() < 1e-9);
  }

  #[test]
  fn success_keeps_reps_increasing_and_intervals_non_decreasing() {
    let now = Utc::now();
    let mut item = fresh_item(now);
    let mut last_reps = 0;
    let mut last_interval = 0;
    for _ in 0..8 {
      apply_quality(&mut item, 4, now);
      assert!(item.reps > last_reps);
      if last_reps >= 2 {
        assert!(item.interval_days >= last_interval);
      }
      last_reps = item.reps;
      last_interval = item.interval_days;
    }
  }

  #[tokio::test]
  async fn schedule_review_persists_state() {
    let store = testutil::store().await;
    let catalog = testutil::seed_flexbox_catalog(&store).await;
    let user_id = Uuid::new_v4();
    let alo_id = catalog.alos[0].alo_id;
    let now = Utc::now();

    schedule_review(&store, user_id, alo_id, 5, now).await.unwrap();
    schedule_review(&store, user_id, alo_id, 5, now).await.unwrap();

    let item = store
      .get_review_item(user_id, alo_id)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(item.reps, 2);
    assert_eq!(item.interval_days, 6);

    // Due nothing now, one item within a week.
    assert!(due_reviews(&store, user_id, now).await.unwrap().is_empty());
    let upcoming = upcoming_reviews(&store, user_id, 7, now).await.unwrap();
    assert_eq!(upcoming.len(), 1);
  }
}
