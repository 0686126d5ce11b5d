//! Error taxonomy for the session controller.
//!
//! Every variant is a recoverable, user-visible condition: the controller's
//! intent dispatch turns each one into a single notification and carries on.
//! Nothing here is fatal to the page session.

use thiserror::Error;

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Unknown challenge id. Selection aborts with no state change.
    #[error("challenge {0} not found")]
    NotFound(u32),

    /// Hint or submit attempted with nothing selected.
    #[error("no challenge selected")]
    NoSelection,

    /// Hint or submit attempted on a challenge already solved.
    #[error("challenge {0} is already completed")]
    AlreadyCompleted(u32),

    /// Hint index outside the current challenge's hint range.
    #[error("hint index {index} out of range ({count} hints)")]
    HintOutOfRange { index: usize, count: usize },

    /// Server or transport error while fetching hint text.
    /// The hint was not charged and remains revealable.
    #[error("hint fetch failed: {0}")]
    HintFetchFailed(String),

    /// Learner code does not define the required entry point.
    #[error("function '{0}' is not defined")]
    EntryPointMissing(String),

    /// Learner code faulted during sandbox evaluation (compile error,
    /// runtime error, or an exhausted operation/time budget).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Any transport-level failure talking to the grading backend.
    /// State is unchanged and the request may be retried.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The backend graded the submission and declared it incorrect.
    #[error("{0}")]
    GradingRejected(String),

    /// Invalid configuration (bad base URL, zero sandbox budget, ...).
    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        let msg = if e.is_timeout() {
            "request timed out".to_string()
        } else if e.is_connect() {
            format!("connection failed: {e}")
        } else if e.is_decode() {
            format!("malformed response: {e}")
        } else {
            e.to_string()
        };
        SessionError::NetworkFailure(msg)
    }
}
