//! SQL schema for the Lyceum SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS knowledge_components (
    kc_id       TEXT PRIMARY KEY,
    slug        TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL,
    description TEXT,
    tags        TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    created_at  TEXT NOT NULL
);

-- Directed edge: kc_id requires prereq_kc_id first.
CREATE TABLE IF NOT EXISTS prerequisites (
    kc_id        TEXT NOT NULL REFERENCES knowledge_components(kc_id),
    prereq_kc_id TEXT NOT NULL REFERENCES knowledge_components(kc_id),
    PRIMARY KEY (kc_id, prereq_kc_id)
);

CREATE TABLE IF NOT EXISTS learning_objectives (
    lo_id      TEXT PRIMARY KEY,
    kc_id      TEXT NOT NULL REFERENCES knowledge_components(kc_id),
    verb       TEXT NOT NULL,
    context    TEXT,
    difficulty INTEGER NOT NULL DEFAULT 0,   -- -2..=2
    rubric     TEXT NOT NULL,                -- JSON evidence contract
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS alos (
    alo_id          TEXT PRIMARY KEY,
    lo_id           TEXT NOT NULL REFERENCES learning_objectives(lo_id),
    alo_type        TEXT NOT NULL,           -- discriminant of AloContent variant
    content_json    TEXT NOT NULL,           -- JSON payload (inner data only)
    assessment_spec TEXT,                    -- JSON or NULL
    est_time_sec    INTEGER NOT NULL,
    difficulty      INTEGER NOT NULL DEFAULT 0,
    tags            TEXT NOT NULL DEFAULT '[]',
    created_at      TEXT NOT NULL
);

-- Skill graph and schedule are frozen at compile time; only status mutates.
CREATE TABLE IF NOT EXISTS courses (
    course_id   TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL,
    goal        TEXT NOT NULL,
    skill_graph TEXT NOT NULL,               -- JSON SkillGraph
    schedule    TEXT NOT NULL,               -- JSON array of ScheduleDay
    status      TEXT NOT NULL DEFAULT 'active',  -- 'active' | 'paused' | 'completed'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    session_id TEXT PRIMARY KEY,
    course_id  TEXT NOT NULL REFERENCES courses(course_id),
    started_at TEXT NOT NULL,
    ended_at   TEXT,
    status     TEXT NOT NULL DEFAULT 'active'    -- 'active' | 'ended'
);

-- Attempts are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS attempts (
    attempt_id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(session_id),
    alo_id     TEXT NOT NULL REFERENCES alos(alo_id),
    event_time TEXT NOT NULL,
    correct    INTEGER,                      -- 0/1 or NULL for no binary outcome
    latency_ms INTEGER,
    hints_used INTEGER NOT NULL DEFAULT 0,
    payload    TEXT                          -- raw client signal, JSON or NULL
);

CREATE TABLE IF NOT EXISTS mastery_estimates (
    user_id        TEXT NOT NULL,
    kc_id          TEXT NOT NULL REFERENCES knowledge_components(kc_id),
    theta          REAL NOT NULL DEFAULT 0.5,
    attempts_count INTEGER NOT NULL DEFAULT 0,
    correct_count  INTEGER NOT NULL DEFAULT 0,
    updated_at     TEXT NOT NULL,
    PRIMARY KEY (user_id, kc_id)
);

CREATE TABLE IF NOT EXISTS review_queue (
    user_id       TEXT NOT NULL,
    alo_id        TEXT NOT NULL REFERENCES alos(alo_id),
    next_due      TEXT NOT NULL,
    interval_days INTEGER NOT NULL DEFAULT 1,
    easiness      REAL NOT NULL DEFAULT 2.5,
    reps          INTEGER NOT NULL DEFAULT 0,
    updated_at    TEXT NOT NULL,
    PRIMARY KEY (user_id, alo_id)
);

CREATE INDEX IF NOT EXISTS los_kc_idx           ON learning_objectives(kc_id);
CREATE INDEX IF NOT EXISTS alos_lo_idx          ON alos(lo_id);
CREATE INDEX IF NOT EXISTS courses_user_idx     ON courses(user_id);
CREATE INDEX IF NOT EXISTS sessions_course_idx  ON sessions(course_id);
CREATE INDEX IF NOT EXISTS attempts_session_idx ON attempts(session_id);
CREATE INDEX IF NOT EXISTS attempts_alo_idx     ON attempts(alo_id);
CREATE INDEX IF NOT EXISTS review_due_idx       ON review_queue(user_id, next_due);

PRAGMA user_version = 1;
";
