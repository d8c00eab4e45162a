// src/models/result.rs

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    question::Question,
    quiz::QuizSummary,
    user::UserSummary,
};

/// Question text recorded when an answered id does not resolve.
pub const UNKNOWN_QUESTION: &str = "Unknown question";

/// Explanation recorded when the question has none.
pub const NO_EXPLANATION: &str = "No explanation provided";

/// Point-in-time copy of one answered question.
/// Never re-derived from the live question bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerSnapshot {
    /// The key as submitted by the client.
    pub question_id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub chosen_answer: String,
    pub correct: bool,
}

/// A recorded quiz attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizResult {
    pub id: Uuid,
    pub quiz_id: Uuid,
    pub user_id: Option<Uuid>,
    pub student_name: String,
    pub answers: Vec<AnswerSnapshot>,
    /// Presentation order shown to this respondent.
    pub question_order: Vec<String>,
    pub score: i64,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub wrong_answers: i64,
    /// Client-reported elapsed seconds.
    pub time_taken: i64,
    pub attempted_at: DateTime<Utc>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    pub quiz_id: Option<String>,
    /// Display name; falls back to the caller's username.
    pub student_name: Option<String>,
    /// Question id -> chosen option text, in submission order.
    pub answers: Option<IndexMap<String, String>>,
    pub score: Option<i64>,
    pub total: Option<i64>,
    pub time_taken: Option<i64>,
    pub question_order: Option<Vec<String>>,
}

/// A result with its quiz and user joined in. Either join may be missing.
#[derive(Debug, Clone, Serialize)]
pub struct ResultView {
    #[serde(flatten)]
    pub result: QuizResult,
    pub quiz: Option<QuizSummary>,
    pub user: Option<UserSummary>,
}

/// A single attempt with the original questions re-resolved in stored order.
#[derive(Debug, Clone, Serialize)]
pub struct ResultDetail {
    #[serde(flatten)]
    pub view: ResultView,
    pub questions: Vec<Question>,
}
