//! CodeQuest · Challenge Session Controller
//!
//! Client-side session controller for a coding-challenge learning platform:
//! challenge lifecycle, the hint-penalty economy, sandboxed evaluation of
//! learner code against server-supplied test arguments, and the three-shape
//! submission protocol to the grading backend. Rendering is left to the host,
//! which implements [`projector::Projector`] and feeds intents back in.
//!
//! Important env variables:
//!   GRADER_BASE_URL     : grading backend base URL (default "http://127.0.0.1:5000")
//!   SESSION_CONFIG_PATH : path to TOML config (backend URL, timeouts, sandbox limits)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

pub mod catalog;
pub mod config;
pub mod domain;
pub mod economy;
pub mod error;
pub mod grader;
pub mod projector;
pub mod protocol;
pub mod sandbox;
pub mod session;
pub mod telemetry;
mod util;

pub use catalog::{ChallengeCatalog, CompletionRegistry};
pub use config::SessionConfig;
pub use domain::{ArgTuple, Challenge, ChallengeKind, Hint, LearnerProgress};
pub use economy::HintLedger;
pub use error::{Result, SessionError};
pub use grader::{GradeOutcome, GraderClient};
pub use projector::{Notice, Projector, SessionView};
pub use sandbox::{Sandbox, SandboxLimits};
pub use session::{HintReveal, SessionController, SessionEvent, UiIntent};
