//! Evidence assessment — grading a submission against an ALO.
//!
//! One exhaustive match over [`AloContent`], one policy per variant, checked
//! at compile time. Passing a submission updates mastery and feeds the
//! spaced-repetition queue.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use lyceum_core::{
  catalog::{Alo, AloContent},
  store::LearningStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Result, srs, tracer};

/// One named check result supplied with a submission (client- or
/// server-side).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
  pub name:    String,
  pub passed:  bool,
  #[serde(default)]
  pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
  pub passed:   bool,
  pub feedback: String,
}

/// The outcome of a full evidence submission.
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceOutcome {
  pub passed:        bool,
  pub feedback:      String,
  /// New theta values keyed by KC id.
  pub theta_updated: HashMap<Uuid, f64>,
}

/// Grade artifacts and check results against one ALO.
pub fn assess(
  alo: &Alo,
  artifacts: &[serde_json::Value],
  checks: &[CheckResult],
) -> Assessment {
  // Any failed check short-circuits, regardless of ALO type.
  let failed: Vec<&str> = checks
    .iter()
    .filter(|c| !c.passed)
    .map(|c| c.name.as_str())
    .collect();
  if !failed.is_empty() {
    return Assessment {
      passed:   false,
      feedback: format!(
        "Some checks did not pass: {}. Review the requirements and try \
         again.",
        failed.join(", ")
      ),
    };
  }

  match &alo.content {
    AloContent::Quiz(_) => match checks.first() {
      Some(check) if check.passed => Assessment {
        passed:   true,
        feedback: "Correct! Well done.".into(),
      },
      _ => Assessment {
        passed:   false,
        feedback: "No check result was submitted for this quiz.".into(),
      },
    },
    AloContent::Exercise(_) => Assessment {
      passed:   true,
      feedback: "Excellent! Your solution meets all requirements.".into(),
    },
    AloContent::Project(content) => {
      let passed_count = checks.len();
      let total = content.acceptance_tests.len();
      if passed_count == total {
        Assessment {
          passed:   true,
          feedback: format!(
            "Outstanding! Your project passes all {total} acceptance tests."
          ),
        }
      } else {
        Assessment {
          passed:   false,
          feedback: format!(
            "Your project passes {passed_count}/{total} acceptance tests. \
             Keep working to meet all criteria."
          ),
        }
      }
    }
    AloContent::Explain(_) | AloContent::Example(_) => {
      if artifacts.is_empty() {
        Assessment {
          passed:   false,
          feedback: "Please provide your response.".into(),
        }
      } else {
        Assessment {
          passed:   true,
          feedback: "Great! You've engaged with this content.".into(),
        }
      }
    }
  }
}

/// Assess a submission, apply the mastery update, and — on a pass —
/// schedule the spaced review (quality 5 when every check passed, 3
/// otherwise).
pub async fn submit_evidence<S: LearningStore>(
  store: &S,
  user_id: Uuid,
  alo_id: Uuid,
  artifacts: &[serde_json::Value],
  checks: &[CheckResult],
  now: DateTime<Utc>,
) -> Result<EvidenceOutcome> {
  let alo = store
    .get_alo(alo_id)
    .await
    .map_err(EngineError::store)?
    .ok_or(EngineError::AloNotFound(alo_id))?;
  let lo = store
    .get_lo(alo.lo_id)
    .await
    .map_err(EngineError::store)?
    .ok_or(EngineError::LoNotFound(alo.lo_id))?;

  let assessment = assess(&alo, artifacts, checks);

  let new_theta = tracer::update_theta(
    store,
    user_id,
    lo.kc_id,
    assessment.passed,
    alo.difficulty,
    now,
  )
  .await?;
  let theta_updated = HashMap::from([(lo.kc_id, new_theta)]);

  if assessment.passed {
    let quality = if checks.iter().all(|c| c.passed) { 5 } else { 3 };
    srs::schedule_review(store, user_id, alo_id, quality, now).await?;
  }

  tracing::info!(
    %alo_id,
    passed = assessment.passed,
    theta = new_theta,
    "evidence submitted"
  );

  Ok(EvidenceOutcome {
    passed: assessment.passed,
    feedback: assessment.feedback,
    theta_updated,
  })
}
