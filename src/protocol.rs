//! Wire DTOs for the grading backend endpoints (serde ready).
//! Keep this small and stable to evolve client and backend independently.

use serde::{Deserialize, Serialize};

use crate::domain::ArgTuple;

//
// Request bodies
//

/// JSON body for `POST /submit_results` (free-text grading).
#[derive(Debug, Serialize)]
pub struct AnswerSubmission {
    pub challenge_id: u32,
    pub user_answer: String,
}

/// JSON body for `POST /submit_result` (results-shape grading).
#[derive(Debug, Serialize)]
pub struct ResultsSubmission {
    pub challenge_id: u32,
    pub results: Vec<serde_json::Value>,
}

/// JSON body for `POST /get_hint` (lazy hint fetch).
#[derive(Debug, Serialize)]
pub struct HintRequest {
    pub challenge_id: u32,
    pub hint_index: usize,
}

//
// Response bodies
//

/// Response of `POST /submit` (code shape).
#[derive(Debug, Deserialize)]
pub struct CodeGradeResponse {
    pub success: bool,
    /// Learner's new total score (present on success).
    #[serde(default)]
    pub score: Option<u32>,
    /// Points awarded for this challenge.
    #[serde(default)]
    pub challenge_score: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /submit_results` (free-text shape).
#[derive(Debug, Deserialize)]
pub struct AnswerGradeResponse {
    pub success: bool,
    #[serde(default)]
    pub challenge_score: Option<u32>,
}

/// Response of `POST /submit_result` (results shape).
#[derive(Debug, Deserialize)]
pub struct ResultsGradeResponse {
    pub success: bool,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response of `POST /get_hint`. Exactly one of the branches is filled:
/// `hint_text` + `penalty` on success, `error` otherwise.
#[derive(Debug, Deserialize)]
pub struct HintResponse {
    #[serde(default)]
    pub hint_text: Option<String>,
    #[serde(default)]
    pub penalty: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /get_test_arguments?challenge_id=`.
#[derive(Debug, Deserialize)]
pub struct TestArgumentsResponse {
    pub success: bool,
    #[serde(default)]
    pub test_arguments: Vec<ArgTuple>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_grade_success_fixture() {
        let r: CodeGradeResponse = serde_json::from_str(
            r#"{"success": true, "message": "Challenge completed! You earned 80 points.",
                "score": 330, "challenge_score": 80}"#,
        )
        .unwrap();
        assert!(r.success);
        assert_eq!(r.score, Some(330));
        assert_eq!(r.challenge_score, Some(80));
    }

    #[test]
    fn code_grade_rejection_omits_score_fields() {
        let r: CodeGradeResponse =
            serde_json::from_str(r#"{"success": false, "message": "50.0% of tests passed."}"#)
                .unwrap();
        assert!(!r.success);
        assert_eq!(r.score, None);
        assert_eq!(r.message.as_deref(), Some("50.0% of tests passed."));
    }

    #[test]
    fn hint_response_error_branch() {
        let r: HintResponse =
            serde_json::from_str(r#"{"error": "Hint not found."}"#).unwrap();
        assert!(r.hint_text.is_none());
        assert_eq!(r.error.as_deref(), Some("Hint not found."));
    }

    #[test]
    fn test_arguments_decode_as_ordered_tuples() {
        let r: TestArgumentsResponse = serde_json::from_str(
            r#"{"success": true, "test_arguments": [[1], [2], [3, "x"]]}"#,
        )
        .unwrap();
        assert!(r.success);
        assert_eq!(r.test_arguments.len(), 3);
        assert_eq!(r.test_arguments[2][1], serde_json::json!("x"));
    }

    #[test]
    fn submission_bodies_serialize_with_snake_case_keys() {
        let body = serde_json::to_value(HintRequest { challenge_id: 4, hint_index: 1 }).unwrap();
        assert_eq!(body, serde_json::json!({"challenge_id": 4, "hint_index": 1}));

        let body = serde_json::to_value(AnswerSubmission {
            challenge_id: 7,
            user_answer: "a blue whale".into(),
        })
        .unwrap();
        assert_eq!(body["user_answer"], "a blue whale");
    }
}
