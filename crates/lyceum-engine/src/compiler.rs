//! The course compilation pipeline.
//!
//! Fixed stage order: parse → plan → expand → compose → validate →
//! schedule → persist. Validation runs before the course is written, so a
//! rejected request never leaves a partial course behind. The individual
//! stages are plain functions over already-loaded catalog data, which keeps
//! them unit-testable without a store.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lyceum_core::{
  catalog::{Alo, KnowledgeComponent, LearningObjective, PrerequisiteEdge},
  course::{CourseStatus, NewCourse, ScheduleDay, SkillGraph},
  store::LearningStore,
};

use crate::{EngineError, Result, intent};

/// Assumed average learning-objective length, used to cap the plan size.
const AVG_LO_MINUTES: u32 = 12;

/// Total composition budget spans this many daily budgets.
const COMPOSE_HORIZON_DAYS: u32 = 30;

// ─── Request / response ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CompileRequest {
  pub goal:                    String,
  pub time_budget_min_per_day: u32,
  #[serde(default)]
  pub deadline:                Option<NaiveDate>,
  /// Slugs of knowledge components the learner already knows.
  #[serde(default)]
  pub prior_knowledge:         Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledCourse {
  pub course_id:                Uuid,
  pub skill_graph:              SkillGraph,
  pub schedule:                 Vec<ScheduleDay>,
  pub estimated_total_time_min: u32,
}

// ─── Stage: request validation ───────────────────────────────────────────────

fn validate_request(request: &CompileRequest) -> Vec<String> {
  let mut errors = Vec::new();

  let goal_len = request.goal.trim().chars().count();
  if !(10..=500).contains(&goal_len) {
    errors.push(format!(
      "goal must be 10..=500 characters, got {goal_len}"
    ));
  }

  if !(5..=180).contains(&request.time_budget_min_per_day) {
    errors.push(format!(
      "time_budget_min_per_day must be 5..=180, got {}",
      request.time_budget_min_per_day
    ));
  }

  errors
}

// ─── Stage: plan ─────────────────────────────────────────────────────────────

/// Select target learning objectives: LOs whose KC tags overlap the detected
/// tags (all LOs when nothing matches), easiest first, capped by the planning
/// budget.
fn plan(
  intent: &intent::Intent,
  kcs: &[KnowledgeComponent],
  los: &[LearningObjective],
  planning_budget_min: u32,
) -> Vec<Uuid> {
  let matching_kc_ids: HashSet<Uuid> = kcs
    .iter()
    .filter(|kc| {
      kc.tags
        .iter()
        .any(|tag| intent.detected_tags.contains(tag))
    })
    .map(|kc| kc.kc_id)
    .collect();

  let mut candidates: Vec<&LearningObjective> = los
    .iter()
    .filter(|lo| matching_kc_ids.contains(&lo.kc_id))
    .collect();

  // Sparse catalog fallback: guarantee forward progress.
  if candidates.is_empty() {
    candidates = los.iter().collect();
  }

  // Easiest first — a pedagogical ordering, not an optimisation.
  candidates.sort_by_key(|lo| lo.difficulty);

  let max_los = (planning_budget_min / AVG_LO_MINUTES).max(1) as usize;
  candidates.truncate(max_los);

  candidates.iter().map(|lo| lo.lo_id).collect()
}

// ─── Stage: expand ───────────────────────────────────────────────────────────

/// Breadth-first prerequisite closure from the target LOs' KCs, minus prior
/// knowledge. Returns the induced KC set, the edges fully contained in it,
/// and *all* LOs of the required KCs (prerequisite KCs contribute their own
/// LOs too). Fails on a prerequisite cycle in the induced graph.
fn expand(
  target_lo_ids: &[Uuid],
  prior_knowledge_slugs: &[String],
  kcs: &[KnowledgeComponent],
  edges: &[PrerequisiteEdge],
  los: &[LearningObjective],
) -> Result<(Vec<KnowledgeComponent>, Vec<PrerequisiteEdge>, Vec<LearningObjective>)>
{
  let target_set: HashSet<Uuid> = target_lo_ids.iter().copied().collect();

  let mut prereq_map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
  for edge in edges {
    prereq_map.entry(edge.kc_id).or_default().push(edge.prereq_kc_id);
  }

  let mut required: HashSet<Uuid> = los
    .iter()
    .filter(|lo| target_set.contains(&lo.lo_id))
    .map(|lo| lo.kc_id)
    .collect();
  let mut queue: VecDeque<Uuid> = required.iter().copied().collect();

  while let Some(kc_id) = queue.pop_front() {
    if let Some(prereqs) = prereq_map.get(&kc_id) {
      for prereq_id in prereqs {
        if required.insert(*prereq_id) {
          queue.push_back(*prereq_id);
        }
      }
    }
  }

  // Subtract prior knowledge by slug.
  let prior_ids: HashSet<Uuid> = kcs
    .iter()
    .filter(|kc| prior_knowledge_slugs.contains(&kc.slug))
    .map(|kc| kc.kc_id)
    .collect();
  required.retain(|id| !prior_ids.contains(id));

  let induced_edges: Vec<PrerequisiteEdge> = edges
    .iter()
    .filter(|e| required.contains(&e.kc_id) && required.contains(&e.prereq_kc_id))
    .copied()
    .collect();

  verify_acyclic(&required, &induced_edges)?;

  let required_kcs: Vec<KnowledgeComponent> = kcs
    .iter()
    .filter(|kc| required.contains(&kc.kc_id))
    .cloned()
    .collect();

  let required_los: Vec<LearningObjective> = los
    .iter()
    .filter(|lo| required.contains(&lo.kc_id))
    .cloned()
    .collect();

  Ok((required_kcs, induced_edges, required_los))
}

/// Kahn's algorithm over the induced prerequisite graph. The closure above
/// terminates on any input thanks to the visited set; this is the explicit
/// guard that turns a cyclic catalog into a compile error instead of a
/// nonsensical plan.
fn verify_acyclic(
  kc_ids: &HashSet<Uuid>,
  edges: &[PrerequisiteEdge],
) -> Result<()> {
  let mut in_degree: HashMap<Uuid, usize> =
    kc_ids.iter().map(|id| (*id, 0)).collect();
  let mut dependents: HashMap<Uuid, Vec<Uuid>> = HashMap::new();

  for edge in edges {
    *in_degree.entry(edge.kc_id).or_default() += 1;
    dependents.entry(edge.prereq_kc_id).or_default().push(edge.kc_id);
  }

  let mut ready: VecDeque<Uuid> = in_degree
    .iter()
    .filter(|(_, deg)| **deg == 0)
    .map(|(id, _)| *id)
    .collect();

  let mut processed = 0usize;
  while let Some(id) = ready.pop_front() {
    processed += 1;
    if let Some(next) = dependents.get(&id) {
      for dependent in next {
        let deg = in_degree.get_mut(dependent).unwrap();
        *deg -= 1;
        if *deg == 0 {
          ready.push_back(*dependent);
        }
      }
    }
  }

  if processed != kc_ids.len() {
    return Err(EngineError::PrerequisiteCycle);
  }
  Ok(())
}

// ─── Stage: compose ──────────────────────────────────────────────────────────

/// Greedy selection over ALOs already ordered by `(difficulty, type)`.
/// Stops — does not skip — at the first ALO that would overflow the budget;
/// truncation is the intended semantics.
fn compose(candidate_alos: Vec<Alo>, time_budget_sec: u64) -> Vec<Alo> {
  let mut selected = Vec::new();
  let mut total: u64 = 0;

  for alo in candidate_alos {
    if total + u64::from(alo.est_time_sec) > time_budget_sec {
      tracing::debug!(
        selected = selected.len(),
        "composition budget reached, truncating"
      );
      break;
    }
    total += u64::from(alo.est_time_sec);
    selected.push(alo);
  }

  selected
}

// ─── Stage: validate ─────────────────────────────────────────────────────────

/// Structural completeness checks on the assembled plan. Returns the full
/// message list; an empty list means the plan is valid.
fn validate_plan(
  kcs: &[KnowledgeComponent],
  los: &[LearningObjective],
  alos: &[Alo],
) -> Vec<String> {
  let mut errors = Vec::new();

  if kcs.is_empty() {
    errors.push("no knowledge components in course".to_string());
  }
  if los.is_empty() {
    errors.push("no learning objectives in course".to_string());
  }
  if alos.is_empty() {
    errors.push("no atomic learning objects in course".to_string());
  }

  let covered: HashSet<Uuid> = alos.iter().map(|a| a.lo_id).collect();
  let uncovered = los.iter().filter(|lo| !covered.contains(&lo.lo_id)).count();
  if uncovered > 0 {
    errors.push(format!("{uncovered} learning objectives have no ALOs"));
  }

  for alo in alos {
    if alo.est_time_sec == 0 {
      errors.push(format!("ALO {} has invalid time estimate", alo.alo_id));
    }
    if alo.est_time_sec > 3600 {
      errors.push(format!(
        "ALO {} time estimate too long ({}s)",
        alo.alo_id, alo.est_time_sec
      ));
    }
    if alo.content.is_empty() {
      errors.push(format!("ALO {} has empty content", alo.alo_id));
    }
  }

  errors
}

// ─── Stage: schedule ─────────────────────────────────────────────────────────

/// Greedy daily bin-packing. A day is closed when the next ALO would
/// overflow it, but every day holds at least one ALO — an oversized ALO is
/// never split or dropped.
fn build_schedule(alos: &[Alo], minutes_per_day: u32) -> Vec<ScheduleDay> {
  let budget_sec = u64::from(minutes_per_day) * 60;
  let mut schedule: Vec<ScheduleDay> = Vec::new();
  let mut day = 1u32;
  let mut current_ids: Vec<Uuid> = Vec::new();
  let mut current_time: u64 = 0;

  for alo in alos {
    if current_time + u64::from(alo.est_time_sec) > budget_sec
      && !current_ids.is_empty()
    {
      schedule.push(ScheduleDay {
        day,
        alo_ids: std::mem::take(&mut current_ids),
      });
      day += 1;
      current_time = 0;
    }
    current_ids.push(alo.alo_id);
    current_time += u64::from(alo.est_time_sec);
  }

  if !current_ids.is_empty() {
    schedule.push(ScheduleDay {
      day,
      alo_ids: current_ids,
    });
  }

  schedule
}

// ─── Orchestration ───────────────────────────────────────────────────────────

/// Run the full pipeline and persist the resulting course with status
/// `active`. Validation failures abort before anything is written.
pub async fn compile<S: LearningStore>(
  store: &S,
  user_id: Uuid,
  request: &CompileRequest,
) -> Result<CompiledCourse> {
  let request_errors = validate_request(request);
  if !request_errors.is_empty() {
    return Err(EngineError::Validation(request_errors));
  }

  let intent = intent::parse(&request.goal);
  tracing::info!(
    goal = %intent.normalized_goal,
    budget_min = request.time_budget_min_per_day,
    "compiling course"
  );

  let kcs = store.list_kcs().await.map_err(EngineError::store)?;
  let los = store.list_los().await.map_err(EngineError::store)?;

  // Planning sees the budget over an hour-per-minute horizon, which keeps
  // small daily budgets from starving the plan.
  let planning_budget_min = request.time_budget_min_per_day * 60;
  let target_lo_ids = plan(&intent, &kcs, &los, planning_budget_min);

  let edges = store
    .list_prerequisites()
    .await
    .map_err(EngineError::store)?;
  let (required_kcs, induced_edges, required_los) = expand(
    &target_lo_ids,
    &request.prior_knowledge,
    &kcs,
    &edges,
    &los,
  )?;

  let lo_ids: Vec<Uuid> = required_los.iter().map(|lo| lo.lo_id).collect();
  let candidates = store
    .list_alos_for_los(&lo_ids)
    .await
    .map_err(EngineError::store)?;

  let total_budget_sec = u64::from(request.time_budget_min_per_day)
    * 60
    * u64::from(COMPOSE_HORIZON_DAYS);
  let alos = compose(candidates, total_budget_sec);

  let plan_errors = validate_plan(&required_kcs, &required_los, &alos);
  if !plan_errors.is_empty() {
    return Err(EngineError::Validation(plan_errors));
  }

  let schedule = build_schedule(&alos, request.time_budget_min_per_day);

  let total_time_sec: u64 =
    alos.iter().map(|a| u64::from(a.est_time_sec)).sum();
  let estimated_total_time_min = (total_time_sec / 60) as u32;

  let skill_graph = SkillGraph {
    kcs:   required_kcs,
    edges: induced_edges,
    los:   required_los,
    alos,
  };

  let course = store
    .create_course(NewCourse {
      user_id,
      goal: intent.normalized_goal,
      skill_graph: skill_graph.clone(),
      schedule: schedule.clone(),
      status: CourseStatus::Active,
    })
    .await
    .map_err(EngineError::store)?;

  tracing::info!(
    course_id = %course.course_id,
    kcs = skill_graph.kcs.len(),
    los = skill_graph.los.len(),
    alos = skill_graph.alos.len(),
    days = schedule.len(),
    "course compiled"
  );

  Ok(CompiledCourse {
    course_id: course.course_id,
    skill_graph,
    schedule,
    estimated_total_time_min,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
