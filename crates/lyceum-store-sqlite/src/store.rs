//! [`SqliteStore`] — the SQLite implementation of [`LearningStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use lyceum_core::{
  catalog::{
    Alo, KnowledgeComponent, LearningObjective, NewAlo,
    NewKnowledgeComponent, NewLearningObjective, PrerequisiteEdge,
  },
  course::{Course, CourseStatus, NewCourse},
  progress::{MasteryEstimate, ReviewQueueItem},
  session::{Attempt, NewAttempt, Session, SessionStatus},
  store::LearningStore,
};

use crate::{
  encode::{
    RawAlo, RawAttempt, RawCourse, RawKc, RawLo, RawMastery, RawReview,
    RawSession, decode_uuid, encode_course_status, encode_dt,
    encode_schedule, encode_session_status, encode_skill_graph, encode_tags,
    encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lyceum learning store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
#[derive(Debug)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row mappers ─────────────────────────────────────────────────────────────

fn kc_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawKc> {
  Ok(RawKc {
    kc_id:       row.get(0)?,
    slug:        row.get(1)?,
    title:       row.get(2)?,
    description: row.get(3)?,
    tags:        row.get(4)?,
    created_at:  row.get(5)?,
  })
}

fn lo_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawLo> {
  Ok(RawLo {
    lo_id:      row.get(0)?,
    kc_id:      row.get(1)?,
    verb:       row.get(2)?,
    context:    row.get(3)?,
    difficulty: row.get(4)?,
    rubric:     row.get(5)?,
    created_at: row.get(6)?,
  })
}

fn alo_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAlo> {
  Ok(RawAlo {
    alo_id:          row.get(0)?,
    lo_id:           row.get(1)?,
    alo_type:        row.get(2)?,
    content_json:    row.get(3)?,
    assessment_spec: row.get(4)?,
    est_time_sec:    row.get(5)?,
    difficulty:      row.get(6)?,
    tags:            row.get(7)?,
    created_at:      row.get(8)?,
  })
}

fn course_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCourse> {
  Ok(RawCourse {
    course_id:   row.get(0)?,
    user_id:     row.get(1)?,
    goal:        row.get(2)?,
    skill_graph: row.get(3)?,
    schedule:    row.get(4)?,
    status:      row.get(5)?,
    created_at:  row.get(6)?,
  })
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSession> {
  Ok(RawSession {
    session_id: row.get(0)?,
    course_id:  row.get(1)?,
    started_at: row.get(2)?,
    ended_at:   row.get(3)?,
    status:     row.get(4)?,
  })
}

fn attempt_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAttempt> {
  Ok(RawAttempt {
    attempt_id: row.get(0)?,
    session_id: row.get(1)?,
    alo_id:     row.get(2)?,
    event_time: row.get(3)?,
    correct:    row.get(4)?,
    latency_ms: row.get(5)?,
    hints_used: row.get(6)?,
    payload:    row.get(7)?,
  })
}

fn mastery_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawMastery> {
  Ok(RawMastery {
    user_id:        row.get(0)?,
    kc_id:          row.get(1)?,
    theta:          row.get(2)?,
    attempts_count: row.get(3)?,
    correct_count:  row.get(4)?,
    updated_at:     row.get(5)?,
  })
}

fn review_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawReview> {
  Ok(RawReview {
    user_id:       row.get(0)?,
    alo_id:        row.get(1)?,
    next_due:      row.get(2)?,
    interval_days: row.get(3)?,
    easiness:      row.get(4)?,
    reps:          row.get(5)?,
    updated_at:    row.get(6)?,
  })
}

const ALO_COLUMNS: &str = "alo_id, lo_id, alo_type, content_json, \
                           assessment_spec, est_time_sec, difficulty, tags, \
                           created_at";

// ─── LearningStore impl ──────────────────────────────────────────────────────

impl LearningStore for SqliteStore {
  type Error = Error;

  // ── Catalog authoring ───────────────────────────────────────────────────

  async fn add_kc(
    &self,
    input: NewKnowledgeComponent,
  ) -> Result<KnowledgeComponent> {
    let kc = KnowledgeComponent {
      kc_id:       Uuid::new_v4(),
      slug:        input.slug,
      title:       input.title,
      description: input.description,
      tags:        input.tags,
      created_at:  Utc::now(),
    };

    let slug_probe = kc.slug.clone();
    let taken: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM knowledge_components WHERE slug = ?1",
              rusqlite::params![slug_probe],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    if taken {
      return Err(Error::DuplicateSlug(kc.slug));
    }

    let id_str   = encode_uuid(kc.kc_id);
    let slug     = kc.slug.clone();
    let title    = kc.title.clone();
    let desc     = kc.description.clone();
    let tags_str = encode_tags(&kc.tags)?;
    let at_str   = encode_dt(kc.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO knowledge_components
             (kc_id, slug, title, description, tags, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, slug, title, desc, tags_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(kc)
  }

  async fn add_prerequisite(&self, edge: PrerequisiteEdge) -> Result<()> {
    let kc_str     = encode_uuid(edge.kc_id);
    let prereq_str = encode_uuid(edge.prereq_kc_id);

    let kc_probe     = kc_str.clone();
    let prereq_probe = prereq_str.clone();
    let exists: bool = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM prerequisites
               WHERE kc_id = ?1 AND prereq_kc_id = ?2",
              rusqlite::params![kc_probe, prereq_probe],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    if exists {
      return Err(Error::DuplicatePrerequisite {
        kc_id:        edge.kc_id,
        prereq_kc_id: edge.prereq_kc_id,
      });
    }

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO prerequisites (kc_id, prereq_kc_id) VALUES (?1, ?2)",
          rusqlite::params![kc_str, prereq_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn add_lo(
    &self,
    input: NewLearningObjective,
  ) -> Result<LearningObjective> {
    let lo = LearningObjective {
      lo_id:      Uuid::new_v4(),
      kc_id:      input.kc_id,
      verb:       input.verb,
      context:    input.context,
      difficulty: input.difficulty,
      rubric:     input.rubric,
      created_at: Utc::now(),
    };

    let id_str     = encode_uuid(lo.lo_id);
    let kc_str     = encode_uuid(lo.kc_id);
    let verb       = lo.verb.clone();
    let context    = lo.context.clone();
    let difficulty = lo.difficulty as i64;
    let rubric_str = serde_json::to_string(&lo.rubric)?;
    let at_str     = encode_dt(lo.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO learning_objectives
             (lo_id, kc_id, verb, context, difficulty, rubric, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, kc_str, verb, context, difficulty, rubric_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(lo)
  }

  async fn add_alo(&self, input: NewAlo) -> Result<Alo> {
    let alo = Alo {
      alo_id:          Uuid::new_v4(),
      lo_id:           input.lo_id,
      content:         input.content,
      assessment_spec: input.assessment_spec,
      est_time_sec:    input.est_time_sec,
      difficulty:      input.difficulty,
      tags:            input.tags,
      created_at:      Utc::now(),
    };

    let id_str       = encode_uuid(alo.alo_id);
    let lo_str       = encode_uuid(alo.lo_id);
    let alo_type     = alo.content.discriminant().to_owned();
    let content_str  = alo.content.to_json()?.to_string();
    let spec_str     = alo
      .assessment_spec
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;
    let est_time     = alo.est_time_sec as i64;
    let difficulty   = alo.difficulty as i64;
    let tags_str     = encode_tags(&alo.tags)?;
    let at_str       = encode_dt(alo.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO alos
             (alo_id, lo_id, alo_type, content_json, assessment_spec,
              est_time_sec, difficulty, tags, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, lo_str, alo_type, content_str, spec_str, est_time,
            difficulty, tags_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(alo)
  }

  // ── Catalog reads ───────────────────────────────────────────────────────

  async fn get_kc(&self, id: Uuid) -> Result<Option<KnowledgeComponent>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawKc> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT kc_id, slug, title, description, tags, created_at
               FROM knowledge_components WHERE kc_id = ?1",
              rusqlite::params![id_str],
              kc_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawKc::into_kc).transpose()
  }

  async fn list_kcs(&self) -> Result<Vec<KnowledgeComponent>> {
    let raws: Vec<RawKc> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT kc_id, slug, title, description, tags, created_at
           FROM knowledge_components ORDER BY slug",
        )?;
        let rows = stmt
          .query_map([], kc_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawKc::into_kc).collect()
  }

  async fn list_prerequisites(&self) -> Result<Vec<PrerequisiteEdge>> {
    let raws: Vec<(String, String)> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare("SELECT kc_id, prereq_kc_id FROM prerequisites")?;
        let rows = stmt
          .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(kc, prereq)| {
        Ok(PrerequisiteEdge {
          kc_id:        decode_uuid(&kc)?,
          prereq_kc_id: decode_uuid(&prereq)?,
        })
      })
      .collect()
  }

  async fn get_lo(&self, id: Uuid) -> Result<Option<LearningObjective>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawLo> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT lo_id, kc_id, verb, context, difficulty, rubric,
                      created_at
               FROM learning_objectives WHERE lo_id = ?1",
              rusqlite::params![id_str],
              lo_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLo::into_lo).transpose()
  }

  async fn list_los(&self) -> Result<Vec<LearningObjective>> {
    let raws: Vec<RawLo> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT lo_id, kc_id, verb, context, difficulty, rubric, created_at
           FROM learning_objectives",
        )?;
        let rows = stmt
          .query_map([], lo_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawLo::into_lo).collect()
  }

  async fn get_alo(&self, id: Uuid) -> Result<Option<Alo>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAlo> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ALO_COLUMNS} FROM alos WHERE alo_id = ?1"),
              rusqlite::params![id_str],
              alo_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAlo::into_alo).transpose()
  }

  async fn list_alos_for_los(&self, lo_ids: &[Uuid]) -> Result<Vec<Alo>> {
    if lo_ids.is_empty() {
      return Ok(Vec::new());
    }

    let id_strs: Vec<String> =
      lo_ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawAlo> = self
      .conn
      .call(move |conn| {
        let placeholders = std::iter::repeat("?")
          .take(id_strs.len())
          .collect::<Vec<_>>()
          .join(",");
        let sql = format!(
          "SELECT {ALO_COLUMNS} FROM alos
           WHERE lo_id IN ({placeholders})
           ORDER BY difficulty, alo_type"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), alo_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlo::into_alo).collect()
  }

  // ── Courses ─────────────────────────────────────────────────────────────

  async fn create_course(&self, input: NewCourse) -> Result<Course> {
    let course = Course {
      course_id:   Uuid::new_v4(),
      user_id:     input.user_id,
      goal:        input.goal,
      skill_graph: input.skill_graph,
      schedule:    input.schedule,
      status:      input.status,
      created_at:  Utc::now(),
    };

    let id_str     = encode_uuid(course.course_id);
    let user_str   = encode_uuid(course.user_id);
    let goal       = course.goal.clone();
    let graph_str  = encode_skill_graph(&course.skill_graph)?;
    let sched_str  = encode_schedule(&course.schedule)?;
    let status_str = encode_course_status(course.status).to_owned();
    let at_str     = encode_dt(course.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses
             (course_id, user_id, goal, skill_graph, schedule, status,
              created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, user_str, goal, graph_str, sched_str, status_str, at_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(course)
  }

  async fn get_course(&self, id: Uuid) -> Result<Option<Course>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT course_id, user_id, goal, skill_graph, schedule,
                      status, created_at
               FROM courses WHERE course_id = ?1",
              rusqlite::params![id_str],
              course_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  async fn list_courses(
    &self,
    user_id: Uuid,
    status: Option<CourseStatus>,
  ) -> Result<Vec<Course>> {
    let user_str   = encode_uuid(user_id);
    let status_str = status.map(encode_course_status).map(str::to_owned);

    let raws: Vec<RawCourse> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(s) = status_str {
          let mut stmt = conn.prepare(
            "SELECT course_id, user_id, goal, skill_graph, schedule, status,
                    created_at
             FROM courses WHERE user_id = ?1 AND status = ?2
             ORDER BY created_at DESC",
          )?;
          stmt
            .query_map(rusqlite::params![user_str, s], course_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(
            "SELECT course_id, user_id, goal, skill_graph, schedule, status,
                    created_at
             FROM courses WHERE user_id = ?1
             ORDER BY created_at DESC",
          )?;
          stmt
            .query_map(rusqlite::params![user_str], course_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  async fn set_course_status(
    &self,
    id: Uuid,
    status: CourseStatus,
  ) -> Result<()> {
    let id_str     = encode_uuid(id);
    let status_str = encode_course_status(status).to_owned();

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE courses SET status = ?2 WHERE course_id = ?1",
          rusqlite::params![id_str, status_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::CourseNotFound(id));
    }
    Ok(())
  }

  async fn delete_course(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM attempts WHERE session_id IN
             (SELECT session_id FROM sessions WHERE course_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM sessions WHERE course_id = ?1",
          rusqlite::params![id_str],
        )?;
        let n = tx.execute(
          "DELETE FROM courses WHERE course_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(n)
      })
      .await?;

    if changed == 0 {
      return Err(Error::CourseNotFound(id));
    }
    Ok(())
  }

  // ── Sessions ────────────────────────────────────────────────────────────

  async fn create_session(&self, course_id: Uuid) -> Result<Session> {
    let session = Session {
      session_id: Uuid::new_v4(),
      course_id,
      started_at: Utc::now(),
      ended_at:   None,
      status:     SessionStatus::Active,
    };

    let id_str     = encode_uuid(session.session_id);
    let course_str = encode_uuid(session.course_id);
    let at_str     = encode_dt(session.started_at);
    let status_str = encode_session_status(session.status).to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (session_id, course_id, started_at, status)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, course_str, at_str, status_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn get_session(&self, id: Uuid) -> Result<Option<Session>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSession> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT session_id, course_id, started_at, ended_at, status
               FROM sessions WHERE session_id = ?1",
              rusqlite::params![id_str],
              session_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSession::into_session).transpose()
  }

  async fn list_sessions_for_user(&self, user_id: Uuid) -> Result<Vec<Session>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawSession> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.session_id, s.course_id, s.started_at, s.ended_at,
                  s.status
           FROM sessions s
           JOIN courses c ON c.course_id = s.course_id
           WHERE c.user_id = ?1
           ORDER BY s.started_at",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], session_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSession::into_session).collect()
  }

  async fn end_session(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(at);

    // The status guard makes this idempotent: an already-ended session is
    // left untouched and keeps its original end timestamp.
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE sessions SET status = 'ended', ended_at = ?2
           WHERE session_id = ?1 AND status = 'active'",
          rusqlite::params![id_str, at_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Attempts — append-only writes ───────────────────────────────────────

  async fn record_attempt(&self, input: NewAttempt) -> Result<Attempt> {
    let attempt = Attempt {
      attempt_id: Uuid::new_v4(),
      session_id: input.session_id,
      alo_id:     input.alo_id,
      event_time: input.event_time,
      correct:    input.correct,
      latency_ms: input.latency_ms,
      hints_used: input.hints_used,
      payload:    input.payload,
    };

    let id_str      = encode_uuid(attempt.attempt_id);
    let session_str = encode_uuid(attempt.session_id);
    let alo_str     = encode_uuid(attempt.alo_id);
    let at_str      = encode_dt(attempt.event_time);
    let correct     = attempt.correct.map(i64::from);
    let latency     = attempt.latency_ms.map(|l| l as i64);
    let hints       = attempt.hints_used as i64;
    let payload_str = attempt
      .payload
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attempts
             (attempt_id, session_id, alo_id, event_time, correct,
              latency_ms, hints_used, payload)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str, session_str, alo_str, at_str, correct, latency, hints,
            payload_str
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(attempt)
  }

  async fn list_attempts(&self, session_id: Uuid) -> Result<Vec<Attempt>> {
    let session_str = encode_uuid(session_id);

    let raws: Vec<RawAttempt> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT attempt_id, session_id, alo_id, event_time, correct,
                  latency_ms, hints_used, payload
           FROM attempts WHERE session_id = ?1
           ORDER BY event_time",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![session_str], attempt_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttempt::into_attempt).collect()
  }

  async fn list_attempts_for_user(
    &self,
    user_id: Uuid,
    course_id: Option<Uuid>,
  ) -> Result<Vec<Attempt>> {
    let user_str   = encode_uuid(user_id);
    let course_str = course_id.map(encode_uuid);

    let raws: Vec<RawAttempt> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(c) = course_str {
          let mut stmt = conn.prepare(
            "SELECT a.attempt_id, a.session_id, a.alo_id, a.event_time,
                    a.correct, a.latency_ms, a.hints_used, a.payload
             FROM attempts a
             JOIN sessions s ON s.session_id = a.session_id
             JOIN courses c  ON c.course_id  = s.course_id
             WHERE c.user_id = ?1 AND c.course_id = ?2
             ORDER BY a.event_time",
          )?;
          stmt
            .query_map(rusqlite::params![user_str, c], attempt_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(
            "SELECT a.attempt_id, a.session_id, a.alo_id, a.event_time,
                    a.correct, a.latency_ms, a.hints_used, a.payload
             FROM attempts a
             JOIN sessions s ON s.session_id = a.session_id
             JOIN courses c  ON c.course_id  = s.course_id
             WHERE c.user_id = ?1
             ORDER BY a.event_time",
          )?;
          stmt
            .query_map(rusqlite::params![user_str], attempt_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttempt::into_attempt).collect()
  }

  // ── Mastery estimates ───────────────────────────────────────────────────

  async fn get_mastery(
    &self,
    user_id: Uuid,
    kc_id: Uuid,
  ) -> Result<Option<MasteryEstimate>> {
    let user_str = encode_uuid(user_id);
    let kc_str   = encode_uuid(kc_id);

    let raw: Option<RawMastery> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, kc_id, theta, attempts_count, correct_count,
                      updated_at
               FROM mastery_estimates WHERE user_id = ?1 AND kc_id = ?2",
              rusqlite::params![user_str, kc_str],
              mastery_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMastery::into_mastery).transpose()
  }

  async fn list_mastery(&self, user_id: Uuid) -> Result<Vec<MasteryEstimate>> {
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawMastery> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, kc_id, theta, attempts_count, correct_count,
                  updated_at
           FROM mastery_estimates WHERE user_id = ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], mastery_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMastery::into_mastery).collect()
  }

  async fn put_mastery(&self, estimate: MasteryEstimate) -> Result<()> {
    let user_str = encode_uuid(estimate.user_id);
    let kc_str   = encode_uuid(estimate.kc_id);
    let theta    = estimate.theta;
    let attempts = estimate.attempts_count as i64;
    let correct  = estimate.correct_count as i64;
    let at_str   = encode_dt(estimate.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO mastery_estimates
             (user_id, kc_id, theta, attempts_count, correct_count,
              updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT (user_id, kc_id) DO UPDATE SET
             theta          = excluded.theta,
             attempts_count = excluded.attempts_count,
             correct_count  = excluded.correct_count,
             updated_at     = excluded.updated_at",
          rusqlite::params![user_str, kc_str, theta, attempts, correct, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Review queue ────────────────────────────────────────────────────────

  async fn get_review_item(
    &self,
    user_id: Uuid,
    alo_id: Uuid,
  ) -> Result<Option<ReviewQueueItem>> {
    let user_str = encode_uuid(user_id);
    let alo_str  = encode_uuid(alo_id);

    let raw: Option<RawReview> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, alo_id, next_due, interval_days, easiness,
                      reps, updated_at
               FROM review_queue WHERE user_id = ?1 AND alo_id = ?2",
              rusqlite::params![user_str, alo_str],
              review_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReview::into_review).transpose()
  }

  async fn put_review_item(&self, item: ReviewQueueItem) -> Result<()> {
    let user_str = encode_uuid(item.user_id);
    let alo_str  = encode_uuid(item.alo_id);
    let due_str  = encode_dt(item.next_due);
    let interval = item.interval_days as i64;
    let easiness = item.easiness;
    let reps     = item.reps as i64;
    let at_str   = encode_dt(item.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO review_queue
             (user_id, alo_id, next_due, interval_days, easiness, reps,
              updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (user_id, alo_id) DO UPDATE SET
             next_due      = excluded.next_due,
             interval_days = excluded.interval_days,
             easiness      = excluded.easiness,
             reps          = excluded.reps,
             updated_at    = excluded.updated_at",
          rusqlite::params![
            user_str, alo_str, due_str, interval, easiness, reps, at_str
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn due_reviews(
    &self,
    user_id: Uuid,
    as_of: DateTime<Utc>,
  ) -> Result<Vec<ReviewQueueItem>> {
    let user_str  = encode_uuid(user_id);
    let as_of_str = encode_dt(as_of);

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, alo_id, next_due, interval_days, easiness, reps,
                  updated_at
           FROM review_queue
           WHERE user_id = ?1 AND next_due <= ?2
           ORDER BY next_due",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_str, as_of_str], review_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }

  async fn upcoming_reviews(
    &self,
    user_id: Uuid,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
  ) -> Result<Vec<ReviewQueueItem>> {
    let user_str  = encode_uuid(user_id);
    let from_str  = encode_dt(from);
    let until_str = encode_dt(until);

    let raws: Vec<RawReview> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, alo_id, next_due, interval_days, easiness, reps,
                  updated_at
           FROM review_queue
           WHERE user_id = ?1 AND next_due >= ?2 AND next_due <= ?3
           ORDER BY next_due",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_str, from_str, until_str],
            review_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_review).collect()
  }
}
