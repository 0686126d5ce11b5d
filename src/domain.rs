//! Domain models: challenge kinds, hints, the challenge itself, and the
//! learner-progress snapshot supplied by the host page.

use serde::{Deserialize, Serialize};

/// One tuple of arguments for a single entry-point invocation.
pub type ArgTuple = Vec<serde_json::Value>;

/// What kind of challenge is presented to the learner?
/// Everything except `Code` is answered in free text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
  Code,
  Image,
  Audio,
  Video,
  Youtube,
  Text,
}
impl Default for ChallengeKind {
  fn default() -> Self { ChallengeKind::Code }
}

/// One hint with its irrevocable score penalty.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Hint {
  pub text: String,
  #[serde(default)] pub penalty: u32,
}

/// Core challenge structure, loaded once from the host page's challenge list
/// and never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: u32,
  pub name: String,
  #[serde(default)] pub instructions: String,
  #[serde(default, rename = "type")] pub kind: ChallengeKind,
  /// Media locator, present iff kind != code.
  #[serde(default)] pub media: Option<String>,
  /// Full reward before hint penalties.
  #[serde(default)] pub score: u32,
  /// Inline hints. Empty when hint text is server-fetched lazily.
  #[serde(default)] pub hints: Vec<Hint>,
  /// Transport optimization: hint count shipped without text, fetched
  /// per index via the grading backend.
  #[serde(default)] pub hint_count: Option<usize>,
}

impl Challenge {
  /// Effective number of hints, whichever form the record shipped in.
  pub fn hint_total(&self) -> usize {
    if self.hints.is_empty() {
      self.hint_count.unwrap_or(0)
    } else {
      self.hints.len()
    }
  }

  /// True when hint text is available locally (no server round-trip needed).
  pub fn hints_inline(&self) -> bool {
    !self.hints.is_empty()
  }
}

/// Learner-progress snapshot the host page ships at load:
/// total score earned so far plus the ids already solved.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LearnerProgress {
  #[serde(default)] pub score: u32,
  #[serde(default)] pub completed_challenges: Vec<u32>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn challenge_defaults_fill_missing_fields() {
    let c: Challenge =
      serde_json::from_str(r#"{"id": 1, "name": "OddEven"}"#).unwrap();
    assert_eq!(c.kind, ChallengeKind::Code);
    assert_eq!(c.score, 0);
    assert!(c.media.is_none());
    assert_eq!(c.hint_total(), 0);
  }

  #[test]
  fn kind_deserializes_from_type_field() {
    let c: Challenge = serde_json::from_str(
      r#"{"id": 2, "name": "Guess", "type": "image", "media": "/media/2.png", "score": 50}"#,
    )
    .unwrap();
    assert_eq!(c.kind, ChallengeKind::Image);
    assert_eq!(c.media.as_deref(), Some("/media/2.png"));
  }

  #[test]
  fn inline_hints_win_over_hint_count() {
    let c: Challenge = serde_json::from_str(
      r#"{"id": 3, "name": "H", "score": 30,
          "hints": [{"text": "use %", "penalty": 5}], "hint_count": 4}"#,
    )
    .unwrap();
    assert!(c.hints_inline());
    assert_eq!(c.hint_total(), 1);
  }

  #[test]
  fn lazy_hint_count_without_text() {
    let c: Challenge = serde_json::from_str(
      r#"{"id": 4, "name": "L", "score": 30, "hint_count": 2}"#,
    )
    .unwrap();
    assert!(!c.hints_inline());
    assert_eq!(c.hint_total(), 2);
  }
}
