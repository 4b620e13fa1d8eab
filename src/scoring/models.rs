//! Data models for the scoring API.

use serde::{Deserialize, Serialize};

/// A benchmark question as served by the scoring API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    /// Opaque task identifier (UUID).
    pub task_id: String,
    /// Question text.
    pub question: String,
    /// Difficulty level ("1", "2" or "3").
    #[serde(rename = "Level", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Name of the attached file, empty when there is none.
    #[serde(default)]
    pub file_name: String,
}

impl Question {
    /// Create a question without an attachment.
    pub fn new(task_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            question: question.into(),
            level: None,
            file_name: String::new(),
        }
    }

    /// Whether the question references an attached resource.
    pub fn has_attachment(&self) -> bool {
        !self.file_name.trim().is_empty()
    }
}

/// One answer in a submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerPayload {
    pub task_id: String,
    pub submitted_answer: String,
}

/// Request body for `POST /submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub username: String,
    /// Public link to the agent's code.
    pub agent_code: String,
    pub answers: Vec<AnswerPayload>,
}

/// Scoring response for a submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionResult {
    pub username: String,
    /// Percentage of correct answers.
    pub score: f64,
    pub correct_count: u32,
    pub total_attempted: u32,
    pub message: String,
    pub timestamp: String,
}

impl std::fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {:.1}% ({}/{} correct)",
            self.username, self.score, self.correct_count, self.total_attempted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_question() {
        let json = r#"{
            "task_id": "2d83110e-a098-4ebb-9987-066c06fa42d0",
            "question": ".rewsna eht sa \"tfel\" drow eht fo etisoppo eht etirw",
            "Level": "1",
            "file_name": ""
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.task_id, "2d83110e-a098-4ebb-9987-066c06fa42d0");
        assert_eq!(q.level.as_deref(), Some("1"));
        assert!(!q.has_attachment());
    }

    #[test]
    fn test_question_missing_optional_fields() {
        let q: Question =
            serde_json::from_str(r#"{"task_id": "t1", "question": "What?"}"#).unwrap();
        assert!(q.level.is_none());
        assert_eq!(q.file_name, "");
    }

    #[test]
    fn test_submission_result_display() {
        let result = SubmissionResult {
            username: "alice".to_string(),
            score: 35.0,
            correct_count: 7,
            total_attempted: 20,
            ..Default::default()
        };
        assert_eq!(result.to_string(), "alice: 35.0% (7/20 correct)");
    }
}
