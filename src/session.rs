//! The session controller: owns the current selection, drives transitions,
//! and is the only component touching more than one collaborator.
//!
//! State machine: `NoSelection` or `Selected(id)`; the only transition is a
//! selection, from either state. There is no terminal state; the controller
//! lives for the page session.
//!
//! Every asynchronous response is tagged with the epoch of the selection it
//! was issued for. The epoch strictly increases on every selection, so a slow
//! response for a previous selection is dropped even when the learner
//! re-selected the same challenge id in the meantime.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{ChallengeCatalog, CompletionRegistry};
use crate::config::SessionConfig;
use crate::domain::{ArgTuple, Challenge, ChallengeKind};
use crate::economy::HintLedger;
use crate::error::{Result, SessionError};
use crate::grader::{GradeOutcome, GraderClient};
use crate::projector::{HintAffordance, Notice, Projector, SessionView};
use crate::sandbox::{Sandbox, SandboxLimits};

/// The four intents a host UI may forward, and none else.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiIntent {
    SelectChallenge {
        #[serde(rename = "challengeId")]
        challenge_id: u32,
    },
    RevealHint {
        /// The id the UI bound at render time, for stale-click rejection.
        #[serde(rename = "challengeId")]
        challenge_id: u32,
        index: usize,
    },
    Submit {
        payload: String,
    },
}

/// Completion of a spawned fetch, delivered back into the controller.
#[derive(Debug)]
pub enum SessionEvent {
    TestArguments {
        /// Epoch of the selection this fetch was issued for.
        epoch: u64,
        challenge_id: u32,
        result: Result<Vec<ArgTuple>>,
    },
}

/// Outcome of a successful hint reveal, returned for display.
#[derive(Clone, Debug)]
pub struct HintReveal {
    pub index: usize,
    pub text: String,
    pub penalty: u32,
    pub available_score: u32,
}

/// Mutable per-page session state. Owned exclusively by the controller;
/// collaborators get values and return results.
#[derive(Debug, Default)]
struct SessionState {
    epoch: u64,
    current: Option<u32>,
    ledger: HintLedger,
    test_arguments: Option<Vec<ArgTuple>>,
    /// Completion gate for the current selection.
    solved: bool,
    /// Hint text revealed this selection, for re-rendering.
    revealed_texts: HashMap<usize, String>,
    /// Challenges solved within this page session (UI-facing only).
    session_completed: HashSet<u32>,
    /// Learner total as last reported by the server.
    total_score: u32,
}

pub struct SessionController<P: Projector> {
    catalog: ChallengeCatalog,
    registry: CompletionRegistry,
    grader: GraderClient,
    sandbox: Sandbox,
    projector: P,
    state: SessionState,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl<P: Projector> SessionController<P> {
    pub fn new(
        catalog: ChallengeCatalog,
        registry: CompletionRegistry,
        grader: GraderClient,
        sandbox: Sandbox,
        projector: P,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let state = SessionState {
            total_score: registry.starting_score(),
            ..SessionState::default()
        };
        Self {
            catalog,
            registry,
            grader,
            sandbox,
            projector,
            state,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Wire grader and sandbox from config.
    pub fn with_config(
        catalog: ChallengeCatalog,
        registry: CompletionRegistry,
        cfg: &SessionConfig,
        projector: P,
    ) -> Result<Self> {
        let grader = GraderClient::new(cfg)?;
        let sandbox = Sandbox::new(SandboxLimits::from(&cfg.sandbox))?;
        Ok(Self::new(catalog, registry, grader, sandbox, projector))
    }

    //
    // Selection
    //

    /// The single state-machine transition point.
    #[instrument(level = "info", skip(self), fields(%id))]
    pub fn select_challenge(&mut self, id: u32) -> Result<()> {
        let Some(challenge) = self.catalog.lookup(id).cloned() else {
            warn!(target: "challenge", %id, "Selection of unknown challenge");
            return Err(SessionError::NotFound(id));
        };

        // Bumping the epoch invalidates every in-flight fetch for the
        // previous selection.
        self.state.epoch += 1;
        self.state.current = Some(id);
        self.state.ledger.reset(challenge.score);
        self.state.test_arguments = None;
        self.state.revealed_texts.clear();
        self.state.solved = self.is_completed(id);
        info!(target: "challenge", %id, epoch = self.state.epoch, score = challenge.score,
              solved = self.state.solved, "Challenge selected");

        if challenge.kind == ChallengeKind::Code {
            self.spawn_test_argument_fetch(id);
        }

        self.render(&challenge);
        Ok(())
    }

    fn spawn_test_argument_fetch(&self, challenge_id: u32) {
        let grader = self.grader.clone();
        let tx = self.events_tx.clone();
        let epoch = self.state.epoch;
        tokio::spawn(async move {
            let result = grader.fetch_test_arguments(challenge_id).await;
            // Receiver gone means the controller is; nothing to do.
            let _ = tx.send(SessionEvent::TestArguments { epoch, challenge_id, result });
        });
    }

    /// Apply a completed fetch under the staleness check.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::TestArguments { epoch, challenge_id, result } => {
                if epoch != self.state.epoch {
                    debug!(target: "challenge", %challenge_id, stale_epoch = epoch,
                           current_epoch = self.state.epoch,
                           "Dropping stale test-argument response");
                    return;
                }
                match result {
                    Ok(args) => {
                        debug!(target: "challenge", %challenge_id, cases = args.len(), "Test arguments stored");
                        self.state.test_arguments = Some(args);
                    }
                    Err(e) => {
                        // Submission falls back to the code shape.
                        warn!(target: "challenge", %challenge_id, error = %e,
                              "Test-argument fetch failed");
                    }
                }
            }
        }
    }

    //
    // Hints
    //

    /// Reveal one hint at most once per selection, charging its penalty.
    ///
    /// Returns `Ok(None)` for the ignorable cases (stale challenge id,
    /// duplicate click on an already-revealed index).
    #[instrument(level = "info", skip(self), fields(%challenge_id, index))]
    pub async fn reveal_hint(
        &mut self,
        challenge_id: u32,
        index: usize,
    ) -> Result<Option<HintReveal>> {
        let current = self.state.current.ok_or(SessionError::NoSelection)?;
        if current != challenge_id {
            debug!(target: "challenge", %challenge_id, %current,
                   "Ignoring hint request for a stale selection");
            return Ok(None);
        }
        if self.state.solved {
            return Err(SessionError::AlreadyCompleted(challenge_id));
        }
        let challenge = self
            .catalog
            .lookup(current)
            .cloned()
            .ok_or(SessionError::NotFound(current))?;
        let count = challenge.hint_total();
        if index >= count {
            return Err(SessionError::HintOutOfRange { index, count });
        }
        if self.state.ledger.is_revealed(index) {
            debug!(target: "challenge", %challenge_id, index, "Duplicate reveal ignored");
            return Ok(None);
        }

        // Fetch before charging, so a failed fetch leaves the index revealable.
        let (text, penalty) = if challenge.hints_inline() {
            let h = &challenge.hints[index];
            (h.text.clone(), h.penalty)
        } else {
            self.grader.fetch_hint(challenge_id, index).await?
        };

        let Some(available_score) = self.state.ledger.charge(index, penalty) else {
            return Ok(None);
        };
        self.state.revealed_texts.insert(index, text.clone());
        info!(target: "challenge", %challenge_id, index, penalty, available_score, "Hint revealed");

        self.projector.notify(&Notice::HintRevealed {
            index,
            text: text.clone(),
            penalty,
            available_score,
        });
        self.render(&challenge);
        Ok(Some(HintReveal { index, text, penalty, available_score }))
    }

    //
    // Submission
    //

    /// Submit the learner's payload in the shape the current challenge calls
    /// for. The server response is the sole source of truth; local score is
    /// only zeroed after an accepted verdict.
    #[instrument(level = "info", skip(self, payload), fields(payload_len = payload.len()))]
    pub async fn submit(&mut self, payload: &str) -> Result<GradeOutcome> {
        let current = self.state.current.ok_or(SessionError::NoSelection)?;
        if self.state.solved {
            return Err(SessionError::AlreadyCompleted(current));
        }
        let challenge = self
            .catalog
            .lookup(current)
            .cloned()
            .ok_or(SessionError::NotFound(current))?;

        let outcome = match challenge.kind {
            ChallengeKind::Code => match self.state.test_arguments.clone() {
                // Stricter path: evaluate locally, grade the result sequence.
                Some(args) if !args.is_empty() => {
                    let results = self.sandbox.run(payload, &args).await?;
                    self.grader.submit_run_results(current, results).await?
                }
                _ => self.grader.submit_code(current, payload).await?,
            },
            _ => self.grader.submit_answer(current, payload.trim()).await?,
        };

        if !outcome.accepted {
            let message = outcome
                .message
                .clone()
                .unwrap_or_else(|| "Incorrect. Try again!".into());
            info!(target: "challenge", %current, "Submission rejected by grader");
            return Err(SessionError::GradingRejected(message));
        }

        // Accepted. Zeroing is a UI affordance; the server already banked
        // the reward.
        self.state.ledger.zero();
        self.state.solved = true;
        self.state.session_completed.insert(current);
        if let Some(total) = outcome.total_score {
            self.state.total_score = total;
        } else if let Some(points) = outcome.challenge_score {
            self.state.total_score += points;
        }
        info!(target: "challenge", %current, challenge_score = ?outcome.challenge_score,
              total_score = self.state.total_score, "Submission accepted");

        self.projector.notify(&Notice::Accepted {
            message: outcome
                .message
                .clone()
                .unwrap_or_else(|| "Challenge completed!".into()),
            challenge_score: outcome.challenge_score.unwrap_or(0),
            total_score: outcome.total_score,
        });
        self.render(&challenge);
        Ok(outcome)
    }

    //
    // Dispatch & event loop
    //

    /// Run one intent; any failure dead-ends into exactly one notice.
    pub async fn dispatch(&mut self, intent: UiIntent) {
        let outcome = match intent {
            UiIntent::SelectChallenge { challenge_id } => {
                self.select_challenge(challenge_id).map(|_| ())
            }
            UiIntent::RevealHint { challenge_id, index } => {
                self.reveal_hint(challenge_id, index).await.map(|_| ())
            }
            UiIntent::Submit { payload } => self.submit(&payload).await.map(|_| ()),
        };
        if let Err(e) = outcome {
            warn!(target: "challenge", error = %e, "Intent failed");
            let notice = match &e {
                SessionError::GradingRejected(msg) => Notice::TryAgain { message: msg.clone() },
                other => Notice::Error { message: other.to_string() },
            };
            self.projector.notify(&notice);
        }
    }

    /// Page-lifetime actor loop: UI intents and fetch completions, one at a
    /// time. Intents are handled to completion before the next one starts, so
    /// submissions are never pipelined. Ends when the intent channel closes.
    pub async fn run(mut self, mut intents: mpsc::UnboundedReceiver<UiIntent>) {
        let Some(mut events) = self.events_rx.take() else {
            return;
        };
        loop {
            tokio::select! {
                maybe_intent = intents.recv() => match maybe_intent {
                    Some(intent) => self.dispatch(intent).await,
                    None => break,
                },
                Some(event) = events.recv() => self.handle_event(event),
            }
        }
        info!(target: "challenge", "Intent channel closed; session controller stopping");
    }

    /// Apply all fetch completions queued so far. For hosts that drive the
    /// controller by direct calls instead of `run`.
    pub fn drain_events(&mut self) {
        let mut pending = Vec::new();
        if let Some(rx) = self.events_rx.as_mut() {
            while let Ok(ev) = rx.try_recv() {
                pending.push(ev);
            }
        }
        for ev in pending {
            self.handle_event(ev);
        }
    }

    //
    // Read-only accessors
    //

    pub fn current_challenge_id(&self) -> Option<u32> {
        self.state.current
    }

    pub fn available_score(&self) -> u32 {
        self.state.ledger.available_score()
    }

    pub fn test_arguments(&self) -> Option<&[ArgTuple]> {
        self.state.test_arguments.as_deref()
    }

    pub fn total_score(&self) -> u32 {
        self.state.total_score
    }

    /// Solved before this session (registry) or within it.
    pub fn is_completed(&self, id: u32) -> bool {
        self.registry.contains(id) || self.state.session_completed.contains(&id)
    }

    //
    // Projection
    //

    fn render(&mut self, challenge: &Challenge) {
        let view = self.view(challenge);
        self.projector.render(&view);
    }

    fn view(&self, challenge: &Challenge) -> SessionView {
        let solved = self.state.solved;
        let hints = (0..challenge.hint_total())
            .map(|i| {
                let revealed = self.state.ledger.is_revealed(i);
                HintAffordance {
                    index: i,
                    revealed,
                    enabled: !revealed && !solved,
                    text: self.state.revealed_texts.get(&i).cloned(),
                }
            })
            .collect();
        SessionView {
            challenge_id: challenge.id,
            name: challenge.name.clone(),
            instructions: challenge.instructions.clone(),
            kind: challenge.kind,
            media: challenge.media.clone(),
            available_score: self.state.ledger.available_score(),
            hints,
            editor_enabled: challenge.kind == ChallengeKind::Code && !solved,
            submit_enabled: !solved,
            completed: solved,
            total_score: self.state.total_score,
        }
    }
}
