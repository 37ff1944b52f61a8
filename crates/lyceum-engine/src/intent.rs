//! Goal intent parsing — the first compilation stage.
//!
//! Pure and infallible: a free-text goal in, normalized tags and a
//! complexity estimate out. The keyword table is deliberately small; tags
//! it misses simply make the planner fall back to the whole catalog.

use serde::{Deserialize, Serialize};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
  Beginner,
  Intermediate,
  Advanced,
}

/// The parsed form of a free-text learning goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
  pub normalized_goal: String,
  pub detected_tags:   Vec<String>,
  pub complexity:      Complexity,
}

/// Keyword-to-tag table. Each entry maps any of the listed keywords to one
/// canonical topic or level tag.
const TAG_KEYWORDS: &[(&str, &[&str])] = &[
  ("css", &["css"]),
  ("flexbox", &["flexbox", "flex"]),
  ("responsive", &["responsive", "adaptive"]),
  ("layout", &["layout"]),
  ("web", &["web"]),
  ("beginner", &["beginner", "basic", "intro"]),
  ("advanced", &["advanced", "expert", "master"]),
];

/// Parse a goal string into an [`Intent`].
pub fn parse(goal: &str) -> Intent {
  let normalized = goal.trim().to_lowercase();
  let words: Vec<&str> = normalized
    .split(|c: char| !c.is_alphanumeric())
    .filter(|w| !w.is_empty())
    .collect();

  let detected_tags: Vec<String> = TAG_KEYWORDS
    .iter()
    .filter(|(_, keywords)| {
      keywords.iter().any(|k| words.contains(k))
    })
    .map(|(tag, _)| (*tag).to_string())
    .collect();

  let complexity = if detected_tags.iter().any(|t| t == "advanced") {
    Complexity::Advanced
  } else if detected_tags.len() >= 3 || normalized.contains("intermediate") {
    Complexity::Intermediate
  } else {
    Complexity::Beginner
  };

  tracing::debug!(
    tags = ?detected_tags,
    complexity = ?complexity,
    "parsed goal intent"
  );

  Intent {
    normalized_goal: goal.trim().to_string(),
    detected_tags,
    complexity,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detects_topic_tags() {
    let intent = parse("Learn flexbox layout basics");
    assert_eq!(intent.normalized_goal, "Learn flexbox layout basics");
    assert_eq!(intent.detected_tags, vec!["flexbox", "layout", "beginner"]);
  }

  #[test]
  fn keyword_synonyms_map_to_canonical_tag() {
    let intent = parse("build adaptive web pages");
    assert!(intent.detected_tags.contains(&"responsive".to_string()));
    assert!(intent.detected_tags.contains(&"web".to_string()));
  }

  #[test]
  fn advanced_keyword_wins_complexity() {
    let intent = parse("master advanced css flexbox layout");
    assert_eq!(intent.complexity, Complexity::Advanced);
  }

  #[test]
  fn three_tags_imply_intermediate() {
    let intent = parse("learn flexbox layout basics");
    assert_eq!(intent.detected_tags.len(), 3);
    assert_eq!(intent.complexity, Complexity::Intermediate);
  }

  #[test]
  fn intermediate_keyword_without_tags() {
    let intent = parse("an intermediate course on something obscure");
    assert!(intent.detected_tags.is_empty());
    assert_eq!(intent.complexity, Complexity::Intermediate);
  }

  #[test]
  fn no_matches_default_to_beginner() {
    let intent = parse("quantum knitting");
    assert!(intent.detected_tags.is_empty());
    assert_eq!(intent.complexity, Complexity::Beginner);
  }

  #[test]
  fn substrings_do_not_match() {
    // "cssy" and "weblike" must not fire the css/web keywords.
    let intent = parse("cssy weblike things");
    assert!(intent.detected_tags.is_empty());
  }
}
