//! HTTP client for the grading backend.
//!
//! One `reqwest::Client` is built once with a timeout and cloned into spawned
//! fetch tasks. Calls are instrumented and log endpoint, status, and payload
//! sizes (not contents). The backend response is the sole source of truth for
//! score and completion; nothing here predicts a reward.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::SessionConfig;
use crate::domain::ArgTuple;
use crate::error::{Result, SessionError};
use crate::protocol::{
    AnswerGradeResponse, AnswerSubmission, CodeGradeResponse, HintRequest, HintResponse,
    ResultsGradeResponse, ResultsSubmission, TestArgumentsResponse,
};
use crate::util::trunc_for_log;

/// Normalized grading verdict across the three submission shapes.
#[derive(Clone, Debug)]
pub struct GradeOutcome {
    pub accepted: bool,
    /// Learner's new total score, when the endpoint reports one.
    pub total_score: Option<u32>,
    /// Points awarded for this challenge, when the endpoint reports them.
    pub challenge_score: Option<u32>,
    pub message: Option<String>,
}

#[derive(Clone)]
pub struct GraderClient {
    client: reqwest::Client,
    base_url: String,
}

impl GraderClient {
    pub fn new(cfg: &SessionConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .map_err(|e| SessionError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: cfg.grader_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Code shape: raw source, form-encoded, server-side grading.
    #[instrument(level = "info", skip(self, code), fields(%challenge_id, code_len = code.len()))]
    pub async fn submit_code(&self, challenge_id: u32, code: &str) -> Result<GradeOutcome> {
        let id = challenge_id.to_string();
        let res = self
            .client
            .post(self.url("/submit"))
            .form(&[("code", code), ("challenge_id", id.as_str())])
            .send()
            .await?;
        let body: CodeGradeResponse = check(res).await?.json().await?;
        info!(target: "grader", %challenge_id, accepted = body.success, "Code submission graded");
        Ok(GradeOutcome {
            accepted: body.success,
            total_score: body.score,
            challenge_score: body.challenge_score,
            message: body.message,
        })
    }

    /// Free-text shape for non-code challenges.
    #[instrument(level = "info", skip(self, answer), fields(%challenge_id, answer_len = answer.len()))]
    pub async fn submit_answer(&self, challenge_id: u32, answer: &str) -> Result<GradeOutcome> {
        let res = self
            .client
            .post(self.url("/submit_results"))
            .json(&AnswerSubmission { challenge_id, user_answer: answer.to_string() })
            .send()
            .await?;
        let body: AnswerGradeResponse = check(res).await?.json().await?;
        info!(target: "grader", %challenge_id, accepted = body.success, "Answer submission graded");
        Ok(GradeOutcome {
            accepted: body.success,
            total_score: None,
            challenge_score: body.challenge_score,
            message: None,
        })
    }

    /// Results shape: the sandbox's ordered output sequence, graded
    /// position-wise by the server.
    #[instrument(level = "info", skip(self, results), fields(%challenge_id, cases = results.len()))]
    pub async fn submit_run_results(
        &self,
        challenge_id: u32,
        results: Vec<Value>,
    ) -> Result<GradeOutcome> {
        let res = self
            .client
            .post(self.url("/submit_result"))
            .json(&ResultsSubmission { challenge_id, results })
            .send()
            .await?;
        let body: ResultsGradeResponse = check(res).await?.json().await?;
        info!(target: "grader", %challenge_id, accepted = body.success, "Run results graded");
        Ok(GradeOutcome {
            accepted: body.success,
            total_score: body.score,
            challenge_score: None,
            message: body.message,
        })
    }

    /// Lazy hint fetch by `(challenge_id, hint_index)`.
    ///
    /// All failures on this path fold into `HintFetchFailed`: the hint was
    /// not charged and the caller may retry the same index.
    #[instrument(level = "info", skip(self), fields(%challenge_id, hint_index))]
    pub async fn fetch_hint(&self, challenge_id: u32, hint_index: usize) -> Result<(String, u32)> {
        let res = self
            .client
            .post(self.url("/get_hint"))
            .json(&HintRequest { challenge_id, hint_index })
            .send()
            .await
            .map_err(|e| SessionError::HintFetchFailed(e.to_string()))?;
        let body: HintResponse = check(res)
            .await
            .map_err(|e| SessionError::HintFetchFailed(e.to_string()))?
            .json()
            .await
            .map_err(|e| SessionError::HintFetchFailed(e.to_string()))?;

        if let Some(err) = body.error {
            warn!(target: "grader", %challenge_id, hint_index, error = %err, "Hint fetch rejected");
            return Err(SessionError::HintFetchFailed(err));
        }
        match (body.hint_text, body.penalty) {
            (Some(text), Some(penalty)) => Ok((text, penalty)),
            _ => Err(SessionError::HintFetchFailed("incomplete hint response".into())),
        }
    }

    /// Test-tuple fetch for code challenges, issued fresh on every selection.
    #[instrument(level = "info", skip(self), fields(%challenge_id))]
    pub async fn fetch_test_arguments(&self, challenge_id: u32) -> Result<Vec<ArgTuple>> {
        let res = self
            .client
            .get(self.url("/get_test_arguments"))
            .query(&[("challenge_id", challenge_id)])
            .send()
            .await?;
        let body: TestArgumentsResponse = check(res).await?.json().await?;
        if !body.success {
            return Err(SessionError::NetworkFailure(
                "backend declined test arguments".into(),
            ));
        }
        debug!(target: "grader", %challenge_id, cases = body.test_arguments.len(), "Test arguments fetched");
        Ok(body.test_arguments)
    }
}

/// Promote non-2xx statuses to `NetworkFailure` with a truncated body.
async fn check(res: reqwest::Response) -> Result<reqwest::Response> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    Err(SessionError::NetworkFailure(format!(
        "HTTP {}: {}",
        status,
        trunc_for_log(&body, 200)
    )))
}
