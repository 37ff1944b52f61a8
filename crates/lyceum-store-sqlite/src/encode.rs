//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Structured fields
//! (content payloads, rubrics, tags, skill graphs, schedules) are stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use lyceum_core::{
  catalog::{Alo, AloContent, KnowledgeComponent, LearningObjective},
  course::{Course, CourseStatus, ScheduleDay, SkillGraph},
  progress::{MasteryEstimate, ReviewQueueItem},
  session::{Attempt, Session, SessionStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Statuses ─────────────────────────────────────────────────────────────────

pub fn encode_course_status(s: CourseStatus) -> &'static str {
  match s {
    CourseStatus::Active => "active",
    CourseStatus::Paused => "paused",
    CourseStatus::Completed => "completed",
  }
}

pub fn decode_course_status(s: &str) -> Result<CourseStatus> {
  match s {
    "active" => Ok(CourseStatus::Active),
    "paused" => Ok(CourseStatus::Paused),
    "completed" => Ok(CourseStatus::Completed),
    other => Err(Error::UnknownEnumValue {
      column: "courses.status",
      value:  other.to_string(),
    }),
  }
}

pub fn encode_session_status(s: SessionStatus) -> &'static str {
  match s {
    SessionStatus::Active => "active",
    SessionStatus::Ended => "ended",
  }
}

pub fn decode_session_status(s: &str) -> Result<SessionStatus> {
  match s {
    "active" => Ok(SessionStatus::Active),
    "ended" => Ok(SessionStatus::Ended),
    other => Err(Error::UnknownEnumValue {
      column: "sessions.status",
      value:  other.to_string(),
    }),
  }
}

// ─── JSON columns ─────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_skill_graph(g: &SkillGraph) -> Result<String> {
  Ok(serde_json::to_string(g)?)
}

pub fn encode_schedule(s: &[ScheduleDay]) -> Result<String> {
  Ok(serde_json::to_string(s)?)
}

// ─── Row types ────────────────────────────────────────────────────────────────

/// Raw strings read directly from a `knowledge_components` row.
pub struct RawKc {
  pub kc_id:       String,
  pub slug:        String,
  pub title:       String,
  pub description: Option<String>,
  pub tags:        String,
  pub created_at:  String,
}

impl RawKc {
  pub fn into_kc(self) -> Result<KnowledgeComponent> {
    Ok(KnowledgeComponent {
      kc_id:       decode_uuid(&self.kc_id)?,
      slug:        self.slug,
      title:       self.title,
      description: self.description,
      tags:        decode_tags(&self.tags)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `learning_objectives` row.
pub struct RawLo {
  pub lo_id:      String,
  pub kc_id:      String,
  pub verb:       String,
  pub context:    Option<String>,
  pub difficulty: i64,
  pub rubric:     String,
  pub created_at: String,
}

impl RawLo {
  pub fn into_lo(self) -> Result<LearningObjective> {
    Ok(LearningObjective {
      lo_id:      decode_uuid(&self.lo_id)?,
      kc_id:      decode_uuid(&self.kc_id)?,
      verb:       self.verb,
      context:    self.context,
      difficulty: self.difficulty as i8,
      rubric:     serde_json::from_str(&self.rubric)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `alos` row.
pub struct RawAlo {
  pub alo_id:          String,
  pub lo_id:           String,
  pub alo_type:        String,
  pub content_json:    String,
  pub assessment_spec: Option<String>,
  pub est_time_sec:    i64,
  pub difficulty:      i64,
  pub tags:            String,
  pub created_at:      String,
}

impl RawAlo {
  pub fn into_alo(self) -> Result<Alo> {
    let data: serde_json::Value = serde_json::from_str(&self.content_json)?;
    let content = AloContent::from_parts(&self.alo_type, data)?;

    let assessment_spec = self
      .assessment_spec
      .as_deref()
      .map(serde_json::from_str)
      .transpose()?;

    Ok(Alo {
      alo_id: decode_uuid(&self.alo_id)?,
      lo_id: decode_uuid(&self.lo_id)?,
      content,
      assessment_spec,
      est_time_sec: self.est_time_sec as u32,
      difficulty: self.difficulty as i8,
      tags: decode_tags(&self.tags)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `courses` row.
pub struct RawCourse {
  pub course_id:   String,
  pub user_id:     String,
  pub goal:        String,
  pub skill_graph: String,
  pub schedule:    String,
  pub status:      String,
  pub created_at:  String,
}

impl RawCourse {
  pub fn into_course(self) -> Result<Course> {
    Ok(Course {
      course_id:   decode_uuid(&self.course_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      goal:        self.goal,
      skill_graph: serde_json::from_str(&self.skill_graph)?,
      schedule:    serde_json::from_str(&self.schedule)?,
      status:      decode_course_status(&self.status)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub session_id: String,
  pub course_id:  String,
  pub started_at: String,
  pub ended_at:   Option<String>,
  pub status:     String,
}

impl RawSession {
  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      session_id: decode_uuid(&self.session_id)?,
      course_id:  decode_uuid(&self.course_id)?,
      started_at: decode_dt(&self.started_at)?,
      ended_at:   self.ended_at.as_deref().map(decode_dt).transpose()?,
      status:     decode_session_status(&self.status)?,
    })
  }
}

/// Raw strings read directly from an `attempts` row.
pub struct RawAttempt {
  pub attempt_id: String,
  pub session_id: String,
  pub alo_id:     String,
  pub event_time: String,
  pub correct:    Option<i64>,
  pub latency_ms: Option<i64>,
  pub hints_used: i64,
  pub payload:    Option<String>,
}

impl RawAttempt {
  pub fn into_attempt(self) -> Result<Attempt> {
    Ok(Attempt {
      attempt_id: decode_uuid(&self.attempt_id)?,
      session_id: decode_uuid(&self.session_id)?,
      alo_id:     decode_uuid(&self.alo_id)?,
      event_time: decode_dt(&self.event_time)?,
      correct:    self.correct.map(|c| c != 0),
      latency_ms: self.latency_ms.map(|l| l as u32),
      hints_used: self.hints_used as u32,
      payload:    self
        .payload
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from a `mastery_estimates` row.
pub struct RawMastery {
  pub user_id:        String,
  pub kc_id:          String,
  pub theta:          f64,
  pub attempts_count: i64,
  pub correct_count:  i64,
  pub updated_at:     String,
}

impl RawMastery {
  pub fn into_mastery(self) -> Result<MasteryEstimate> {
    Ok(MasteryEstimate {
      user_id:        decode_uuid(&self.user_id)?,
      kc_id:          decode_uuid(&self.kc_id)?,
      theta:          self.theta,
      attempts_count: self.attempts_count as u32,
      correct_count:  self.correct_count as u32,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `review_queue` row.
pub struct RawReview {
  pub user_id:       String,
  pub alo_id:        String,
  pub next_due:      String,
  pub interval_days: i64,
  pub easiness:      f64,
  pub reps:          i64,
  pub updated_at:    String,
}

impl RawReview {
  pub fn into_review(self) -> Result<ReviewQueueItem> {
    Ok(ReviewQueueItem {
      user_id:       decode_uuid(&self.user_id)?,
      alo_id:        decode_uuid(&self.alo_id)?,
      next_due:      decode_dt(&self.next_due)?,
      interval_days: self.interval_days as u32,
      easiness:      self.easiness,
      reps:          self.reps as u32,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}
