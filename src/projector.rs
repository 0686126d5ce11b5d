//! Projection boundary to the host UI.
//!
//! The controller emits a declarative snapshot after every state change and a
//! notice per user-visible event; rendering is a pure projection the host
//! owns. No business logic belongs behind this trait.

use serde::Serialize;

use crate::domain::ChallengeKind;

/// Receives controller output. Implemented by the host UI layer; tests use a
/// recording implementation.
pub trait Projector {
    /// Full display state for the current selection.
    fn render(&mut self, view: &SessionView);
    /// One user-visible event (hint text, verdicts, errors).
    fn notify(&mut self, notice: &Notice);
}

/// Everything the host needs to draw the current selection.
#[derive(Clone, Debug, Serialize)]
pub struct SessionView {
    pub challenge_id: u32,
    pub name: String,
    pub instructions: String,
    pub kind: ChallengeKind,
    /// Media locator to load, for non-code challenges.
    pub media: Option<String>,
    pub available_score: u32,
    pub hints: Vec<HintAffordance>,
    pub editor_enabled: bool,
    pub submit_enabled: bool,
    /// Already solved, either before this session or within it.
    pub completed: bool,
    /// Learner's total score as last reported by the server.
    pub total_score: u32,
}

/// Per-hint display state.
#[derive(Clone, Debug, Serialize)]
pub struct HintAffordance {
    pub index: usize,
    pub revealed: bool,
    pub enabled: bool,
    /// Present once revealed (and the text is known locally).
    pub text: Option<String>,
}

/// User-visible events. Every controller failure dead-ends into exactly one
/// of these; none of them crash the session.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    HintRevealed {
        index: usize,
        text: String,
        penalty: u32,
        available_score: u32,
    },
    Accepted {
        message: String,
        challenge_score: u32,
        total_score: Option<u32>,
    },
    TryAgain {
        message: String,
    },
    Error {
        message: String,
    },
}
