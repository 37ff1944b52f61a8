//! Compiled course types — the frozen output of the compilation pipeline.
//!
//! Once a course is persisted, its skill graph and schedule never change;
//! only the status field mutates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Alo, KnowledgeComponent, LearningObjective, PrerequisiteEdge};

// ─── Skill graph ─────────────────────────────────────────────────────────────

/// The catalog subset selected for one course at compile time, frozen as
/// part of the course row. Edges are fully contained in `kcs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillGraph {
  pub kcs:   Vec<KnowledgeComponent>,
  pub edges: Vec<PrerequisiteEdge>,
  pub los:   Vec<LearningObjective>,
  pub alos:  Vec<Alo>,
}

impl SkillGraph {
  /// All ALO ids in the graph, in composition order.
  pub fn alo_ids(&self) -> Vec<Uuid> {
    self.alos.iter().map(|a| a.alo_id).collect()
  }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// One day of the frozen schedule. `alo_ids` reference the course's own
/// skill graph, never the wider catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDay {
  /// 1-based day number.
  pub day:     u32,
  pub alo_ids: Vec<Uuid>,
}

// ─── Course ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseStatus {
  Active,
  Paused,
  Completed,
}

/// One compiled plan owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
  pub course_id:   Uuid,
  pub user_id:     Uuid,
  pub goal:        String,
  pub skill_graph: SkillGraph,
  pub schedule:    Vec<ScheduleDay>,
  pub status:      CourseStatus,
  pub created_at:  DateTime<Utc>,
}

impl Course {
  /// The first ALO a fresh session presents, if any.
  pub fn first_scheduled_alo(&self) -> Option<Uuid> {
    self
      .schedule
      .iter()
      .find_map(|day| day.alo_ids.first().copied())
  }

  /// The ALO that follows `alo_id` in the frozen schedule: the next entry
  /// in the same day, else the first entry of the next day. `None` when
  /// `alo_id` is last (or absent).
  pub fn next_scheduled_alo(&self, alo_id: Uuid) -> Option<Uuid> {
    for (day_idx, day) in self.schedule.iter().enumerate() {
      if let Some(pos) = day.alo_ids.iter().position(|id| *id == alo_id) {
        if let Some(next) = day.alo_ids.get(pos + 1) {
          return Some(*next);
        }
        return self
          .schedule
          .get(day_idx + 1)
          .and_then(|next_day| next_day.alo_ids.first().copied());
      }
    }
    None
  }
}

/// Input to [`crate::store::LearningStore::create_course`].
/// `created_at` is always set by the store; it is not accepted from callers.
#[derive(Debug, Clone)]
pub struct NewCourse {
  pub user_id:     Uuid,
  pub goal:        String,
  pub skill_graph: SkillGraph,
  pub schedule:    Vec<ScheduleDay>,
  pub status:      CourseStatus,
}
