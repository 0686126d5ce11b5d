//! Read-only stores seeded once per page load: the challenge index and the
//! set of challenges the learner has already solved.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::domain::{Challenge, LearnerProgress};
use crate::error::{Result, SessionError};

/// Immutable index of challenge records, built once from the host-supplied
/// challenge list. No mutation operations exist past construction.
#[derive(Clone, Debug)]
pub struct ChallengeCatalog {
    by_id: HashMap<u32, Challenge>,
}

impl ChallengeCatalog {
    /// Build the index. Duplicate ids keep the first record seen.
    pub fn new(challenges: Vec<Challenge>) -> Self {
        let mut by_id = HashMap::with_capacity(challenges.len());
        for c in challenges {
            if by_id.contains_key(&c.id) {
                warn!(target: "challenge", id = c.id, name = %c.name, "Duplicate challenge id in seed list; keeping first");
                continue;
            }
            by_id.insert(c.id, c);
        }
        info!(target: "challenge", count = by_id.len(), "Challenge catalog seeded");
        Self { by_id }
    }

    /// Parse the host page's challenge-list JSON and build the index.
    pub fn from_json(json: &str) -> Result<Self> {
        let challenges: Vec<Challenge> = serde_json::from_str(json)
            .map_err(|e| SessionError::Config(format!("bad challenge list: {e}")))?;
        Ok(Self::new(challenges))
    }

    pub fn lookup(&self, id: u32) -> Option<&Challenge> {
        self.by_id.get(&id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Challenges already solved by the current learner, plus the learner's
/// starting total score. Server-sourced, read-only for the session; drives
/// UI gating only and is never authoritative over scoring.
#[derive(Clone, Debug, Default)]
pub struct CompletionRegistry {
    completed: HashSet<u32>,
    starting_score: u32,
}

impl CompletionRegistry {
    pub fn new(progress: LearnerProgress) -> Self {
        Self {
            completed: progress.completed_challenges.into_iter().collect(),
            starting_score: progress.score,
        }
    }

    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        Self { completed: ids.into_iter().collect(), starting_score: 0 }
    }

    /// Parse the host page's learner-progress JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let progress: LearnerProgress = serde_json::from_str(json)
            .map_err(|e| SessionError::Config(format!("bad learner progress: {e}")))?;
        Ok(Self::new(progress))
    }

    pub fn contains(&self, id: u32) -> bool {
        self.completed.contains(&id)
    }

    pub fn starting_score(&self) -> u32 {
        self.starting_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChallengeKind;

    fn ch(id: u32, name: &str) -> Challenge {
        Challenge {
            id,
            name: name.into(),
            instructions: String::new(),
            kind: ChallengeKind::Code,
            media: None,
            score: 100,
            hints: vec![],
            hint_count: None,
        }
    }

    #[test]
    fn lookup_finds_seeded_and_not_unknown() {
        let cat = ChallengeCatalog::new(vec![ch(1, "a"), ch(2, "b")]);
        assert_eq!(cat.lookup(2).map(|c| c.name.as_str()), Some("b"));
        assert!(cat.lookup(99).is_none());
    }

    #[test]
    fn duplicate_ids_keep_first_record() {
        let cat = ChallengeCatalog::new(vec![ch(1, "first"), ch(1, "second")]);
        assert_eq!(cat.len(), 1);
        assert_eq!(cat.lookup(1).map(|c| c.name.as_str()), Some("first"));
    }

    #[test]
    fn registry_parses_host_snapshot() {
        let reg = CompletionRegistry::from_json(
            r#"{"score": 250, "completed_challenges": [1, 3]}"#,
        )
        .unwrap();
        assert!(reg.contains(1));
        assert!(!reg.contains(2));
        assert_eq!(reg.starting_score(), 250);
    }
}
