//! Content library types — the versioned catalog the compiler draws from.
//!
//! The hierarchy is `KnowledgeComponent → LearningObjective → Alo`, with
//! directed prerequisite edges between knowledge components. The catalog is
//! read-only to the engine; authoring happens out of band.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Knowledge component ─────────────────────────────────────────────────────

/// A named unit of subject knowledge. Immutable once referenced by a
/// prerequisite edge or a mastery estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeComponent {
  pub kc_id:       Uuid,
  /// Stable, unique identifier used in prior-knowledge lists and progress
  /// maps (e.g. `"flexbox_fundamentals"`).
  pub slug:        String,
  pub title:       String,
  pub description: Option<String>,
  /// Free-text topic tags matched against goal intent (e.g. `"flexbox"`).
  pub tags:        Vec<String>,
  pub created_at:  DateTime<Utc>,
}

/// A directed prerequisite edge: `kc_id` requires `prereq_kc_id` first.
/// Unique per ordered pair; the full edge set is expected to be acyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteEdge {
  pub kc_id:        Uuid,
  pub prereq_kc_id: Uuid,
}

// ─── Learning objective ──────────────────────────────────────────────────────

/// A specific, assessable goal within a knowledge component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningObjective {
  pub lo_id:      Uuid,
  pub kc_id:      Uuid,
  /// Bloom-style action verb, e.g. `"explain"`, `"apply"`.
  pub verb:       String,
  pub context:    Option<String>,
  /// Relative difficulty in `[-2, 2]`.
  pub difficulty: i8,
  /// Evidence contract: what a passing submission must demonstrate.
  pub rubric:     serde_json::Value,
  pub created_at: DateTime<Utc>,
}

// ─── ALO content payloads ────────────────────────────────────────────────────

/// Didactic prose the learner reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainContent {
  pub markdown:   String,
  #[serde(default)]
  pub asset_urls: Vec<String>,
}

/// A worked example, optionally with code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleContent {
  pub markdown:   String,
  pub code:       Option<String>,
  pub language:   Option<String>,
  #[serde(default)]
  pub asset_urls: Vec<String>,
}

/// A hands-on task the learner completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseContent {
  pub prompt:       String,
  pub starter_code: Option<String>,
  pub language:     Option<String>,
  /// Progressive hints, cheapest first.
  #[serde(default)]
  pub hints:        Vec<String>,
}

/// A single-answer multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizContent {
  pub question:     String,
  pub choices:      Vec<String>,
  pub answer_index: usize,
  pub explanation:  Option<String>,
}

/// A larger deliverable graded against acceptance tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContent {
  pub brief:            String,
  pub acceptance_tests: Vec<String>,
  #[serde(default)]
  pub resources:        Vec<String>,
}

// ─── AloContent ──────────────────────────────────────────────────────────────

/// The five ALO types, closed at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AloType {
  Explain,
  Example,
  Exercise,
  Quiz,
  Project,
}

/// The typed payload of an ALO. The variant name serves as the `alo_type`
/// discriminant stored in the database, so an ALO's type and its content
/// shape can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AloContent {
  Explain(ExplainContent),
  Example(ExampleContent),
  Exercise(ExerciseContent),
  Quiz(QuizContent),
  Project(ProjectContent),
}

impl AloContent {
  pub fn alo_type(&self) -> AloType {
    match self {
      Self::Explain(_) => AloType::Explain,
      Self::Example(_) => AloType::Example,
      Self::Exercise(_) => AloType::Exercise,
      Self::Quiz(_) => AloType::Quiz,
      Self::Project(_) => AloType::Project,
    }
  }

  /// The discriminant string stored in the `alo_type` column.
  /// Must match the `rename_all = "snake_case"` serde tags above.
  pub fn discriminant(&self) -> &'static str {
    match self {
      Self::Explain(_) => "explain",
      Self::Example(_) => "example",
      Self::Exercise(_) => "exercise",
      Self::Quiz(_) => "quiz",
      Self::Project(_) => "project",
    }
  }

  /// Whether the payload carries any learner-facing substance. Used by the
  /// compile-time validator; an empty primary field fails validation.
  pub fn is_empty(&self) -> bool {
    match self {
      Self::Explain(c) => c.markdown.trim().is_empty(),
      Self::Example(c) => c.markdown.trim().is_empty(),
      Self::Exercise(c) => c.prompt.trim().is_empty(),
      Self::Quiz(c) => c.question.trim().is_empty() || c.choices.len() < 2,
      Self::Project(c) => {
        c.brief.trim().is_empty() || c.acceptance_tests.is_empty()
      }
    }
  }

  /// Serialise the inner payload (without the type tag) for the
  /// `content_json` database column.
  pub fn to_json(&self) -> crate::Result<serde_json::Value> {
    let full = serde_json::to_value(self)?;
    Ok(full.get("data").cloned().unwrap_or(serde_json::Value::Null))
  }

  /// Deserialise from the discriminant string and JSON payload stored in
  /// the database.
  pub fn from_parts(
    discriminant: &str,
    data: serde_json::Value,
  ) -> crate::Result<Self> {
    let wrapped = serde_json::json!({ "type": discriminant, "data": data });
    Ok(serde_json::from_value(wrapped)?)
  }
}

// ─── Alo ─────────────────────────────────────────────────────────────────────

/// Atomic Learning Object — the indivisible unit scheduled and attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alo {
  pub alo_id:          Uuid,
  pub lo_id:           Uuid,
  pub content:         AloContent,
  /// Auto-checks, answer keys, or acceptance-test metadata; opaque here.
  pub assessment_spec: Option<serde_json::Value>,
  /// Estimated completion time in seconds. Valid range `1..=3600`.
  pub est_time_sec:    u32,
  /// Relative difficulty in `[-2, 2]`.
  pub difficulty:      i8,
  pub tags:            Vec<String>,
  pub created_at:      DateTime<Utc>,
}

impl Alo {
  pub fn alo_type(&self) -> AloType { self.content.alo_type() }
}

// ─── New-record inputs ───────────────────────────────────────────────────────

/// Input to [`crate::store::LearningStore::add_kc`].
#[derive(Debug, Clone)]
pub struct NewKnowledgeComponent {
  pub slug:        String,
  pub title:       String,
  pub description: Option<String>,
  pub tags:        Vec<String>,
}

/// Input to [`crate::store::LearningStore::add_lo`].
#[derive(Debug, Clone)]
pub struct NewLearningObjective {
  pub kc_id:      Uuid,
  pub verb:       String,
  pub context:    Option<String>,
  pub difficulty: i8,
  pub rubric:     serde_json::Value,
}

/// Input to [`crate::store::LearningStore::add_alo`].
#[derive(Debug, Clone)]
pub struct NewAlo {
  pub lo_id:           Uuid,
  pub content:         AloContent,
  pub assessment_spec: Option<serde_json::Value>,
  pub est_time_sec:    u32,
  pub difficulty:      i8,
  pub tags:            Vec<String>,
}
