//! Shared fixtures for engine tests: an in-memory store and the three-KC
//! CSS → Flexbox → Responsive catalog with 15 ALOs.

use chrono::Utc;
use lyceum_core::{
  catalog::{
    Alo, AloContent, ExampleContent, ExerciseContent, ExplainContent,
    KnowledgeComponent, LearningObjective, NewAlo, NewKnowledgeComponent,
    NewLearningObjective, PrerequisiteEdge, ProjectContent, QuizContent,
  },
  store::LearningStore,
};
use lyceum_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::compiler::CompileRequest;

pub async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

pub fn flexbox_request() -> CompileRequest {
  CompileRequest {
    goal:                    "learn flexbox layout basics".into(),
    time_budget_min_per_day: 20,
    deadline:                None,
    prior_knowledge:         vec![],
  }
}

// ─── Bare domain values for pure-function tests ──────────────────────────────

pub fn bare_kc(slug: &str, tags: &[&str]) -> KnowledgeComponent {
  KnowledgeComponent {
    kc_id:       Uuid::new_v4(),
    slug:        slug.into(),
    title:       slug.into(),
    description: None,
    tags:        tags.iter().map(|t| (*t).to_string()).collect(),
    created_at:  Utc::now(),
  }
}

pub fn bare_lo(kc_id: Uuid, difficulty: i8) -> LearningObjective {
  LearningObjective {
    lo_id: Uuid::new_v4(),
    kc_id,
    verb: "apply".into(),
    context: None,
    difficulty,
    rubric: serde_json::json!({}),
    created_at: Utc::now(),
  }
}

// ─── Seeded catalog ──────────────────────────────────────────────────────────

pub struct TestCatalog {
  pub kcs:  Vec<KnowledgeComponent>,
  pub los:  Vec<LearningObjective>,
  pub alos: Vec<Alo>,
  /// The difficulty-1 exercise with a difficulty-0 sibling in the same LO —
  /// the remediation pair.
  pub flexbox_hard_exercise: Uuid,
  pub flexbox_easy_exercise: Uuid,
}

impl TestCatalog {
  pub fn kc(&self, slug: &str) -> &KnowledgeComponent {
    self
      .kcs
      .iter()
      .find(|kc| kc.slug == slug)
      .expect("catalog kc")
  }

  pub fn alo(&self, id: Uuid) -> &Alo {
    self
      .alos
      .iter()
      .find(|a| a.alo_id == id)
      .expect("catalog alo")
  }
}

fn explain(markdown: &str) -> AloContent {
  AloContent::Explain(ExplainContent {
    markdown:   markdown.into(),
    asset_urls: vec![],
  })
}

fn example(markdown: &str) -> AloContent {
  AloContent::Example(ExampleContent {
    markdown:   markdown.into(),
    code:       Some(".container { display: flex; }".into()),
    language:   Some("css".into()),
    asset_urls: vec![],
  })
}

fn exercise(prompt: &str) -> AloContent {
  AloContent::Exercise(ExerciseContent {
    prompt:       prompt.into(),
    starter_code: Some(".container {}".into()),
    language:     Some("css".into()),
    hints:        vec!["think about the main axis".into()],
  })
}

fn quiz(question: &str) -> AloContent {
  AloContent::Quiz(QuizContent {
    question:     question.into(),
    choices:      vec![
      "display: flex".into(),
      "display: block".into(),
      "float: left".into(),
    ],
    answer_index: 0,
    explanation:  Some("Flex containers opt in with display: flex.".into()),
  })
}

fn project(brief: &str) -> AloContent {
  AloContent::Project(ProjectContent {
    brief:            brief.into(),
    acceptance_tests: vec![
      "layout adapts below 600px".into(),
      "no horizontal scroll at any width".into(),
      "navigation collapses on mobile".into(),
    ],
    resources:        vec![],
  })
}

async fn add_alo<S: LearningStore>(
  store: &S,
  lo_id: Uuid,
  content: AloContent,
  est_time_sec: u32,
  difficulty: i8,
) -> Alo {
  store
    .add_alo(NewAlo {
      lo_id,
      content,
      assessment_spec: None,
      est_time_sec,
      difficulty,
      tags: vec![],
    })
    .await
    .map_err(|e| e.to_string())
    .expect("seed alo")
}

/// Seed the three-KC chain (`css_basics ← flexbox_fundamentals ←
/// responsive_design`) with six LOs and 15 ALOs (4 explain, 3 example,
/// 4 exercise, 3 quiz, 1 project).
pub async fn seed_flexbox_catalog<S: LearningStore>(store: &S) -> TestCatalog {
  let mk_kc = |slug: &str, title: &str, tags: &[&str]| NewKnowledgeComponent {
    slug:        slug.into(),
    title:       title.into(),
    description: None,
    tags:        tags.iter().map(|t| (*t).to_string()).collect(),
  };

  let basics = store
    .add_kc(mk_kc("css_basics", "CSS Basics", &["css", "web"]))
    .await
    .map_err(|e| e.to_string())
    .expect("seed kc");
  let flexbox = store
    .add_kc(mk_kc(
      "flexbox_fundamentals",
      "Flexbox Fundamentals",
      &["flexbox", "css", "layout"],
    ))
    .await
    .map_err(|e| e.to_string())
    .expect("seed kc");
  let responsive = store
    .add_kc(mk_kc(
      "responsive_design",
      "Responsive Design",
      &["responsive", "layout", "web"],
    ))
    .await
    .map_err(|e| e.to_string())
    .expect("seed kc");

  for (kc_id, prereq_kc_id) in [
    (flexbox.kc_id, basics.kc_id),
    (responsive.kc_id, flexbox.kc_id),
  ] {
    store
      .add_prerequisite(PrerequisiteEdge { kc_id, prereq_kc_id })
      .await
      .map_err(|e| e.to_string())
      .expect("seed edge");
  }

  let mut los = Vec::new();
  for (kc_id, difficulty) in [
    (basics.kc_id, -1),
    (basics.kc_id, 0),
    (flexbox.kc_id, 0),
    (flexbox.kc_id, 1),
    (responsive.kc_id, 1),
    (responsive.kc_id, 2),
  ] {
    let lo = store
      .add_lo(NewLearningObjective {
        kc_id,
        verb: "apply".into(),
        context: Some("in a web page".into()),
        difficulty,
        rubric: serde_json::json!({ "evidence": "working css" }),
      })
      .await
      .map_err(|e| e.to_string())
      .expect("seed lo");
    los.push(lo);
  }

  let mut alos = Vec::new();

  // css_basics
  alos.push(add_alo(store, los[0].lo_id, explain("Selectors target elements."), 300, -1).await);
  alos.push(add_alo(store, los[0].lo_id, quiz("Which selector targets a class?"), 120, -1).await);
  alos.push(add_alo(store, los[1].lo_id, explain("The box model wraps every element."), 300, 0).await);
  alos.push(add_alo(store, los[1].lo_id, example("Padding vs margin, side by side."), 240, 0).await);
  alos.push(add_alo(store, los[1].lo_id, exercise("Give this card 16px padding."), 420, 0).await);

  // flexbox_fundamentals
  alos.push(add_alo(store, los[2].lo_id, explain("Flex containers lay out children along one axis."), 300, 0).await);
  alos.push(add_alo(store, los[2].lo_id, example("Centering with justify-content and align-items."), 240, 0).await);
  alos.push(add_alo(store, los[2].lo_id, quiz("Which property sets the main axis?"), 120, 0).await);
  let easy_exercise =
    add_alo(store, los[3].lo_id, exercise("Lay out three cards in a row."), 420, 0).await;
  let hard_exercise =
    add_alo(store, los[3].lo_id, exercise("Build a holy-grail layout with flexbox."), 420, 1).await;
  alos.push(add_alo(store, los[3].lo_id, example("A wrapping gallery with flex-wrap."), 240, 1).await);

  // responsive_design
  alos.push(add_alo(store, los[4].lo_id, explain("Media queries switch layouts by viewport."), 300, 1).await);
  alos.push(add_alo(store, los[4].lo_id, exercise("Stack the sidebar below 600px."), 420, 1).await);
  alos.push(add_alo(store, los[4].lo_id, quiz("Which unit scales with the viewport width?"), 120, 1).await);
  alos.push(add_alo(store, los[5].lo_id, project("Build a responsive landing page."), 900, 2).await);

  let flexbox_hard_exercise = hard_exercise.alo_id;
  let flexbox_easy_exercise = easy_exercise.alo_id;
  alos.push(easy_exercise);
  alos.push(hard_exercise);

  TestCatalog {
    kcs: vec![basics, flexbox, responsive],
    los,
    alos,
    flexbox_hard_exercise,
    flexbox_easy_exercise,
  }
}
