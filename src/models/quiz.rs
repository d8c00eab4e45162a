// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::question::{PublicQuestion, Question};

/// A persisted quiz definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,

    /// Lowercase category tags, `["all"]` when unfiltered.
    pub categories: Vec<String>,

    /// Always equal to `question_ids.len()` at creation.
    pub num_questions: i64,

    /// Assembly order. Never shown to test-takers as-is.
    pub question_ids: Vec<Uuid>,

    /// Duration budget in seconds.
    pub duration: i64,

    #[serde(default)]
    pub description: String,

    pub created_by: String,

    pub certificate_enabled: bool,
    pub certificate_template: String,
    pub certificate_passing_score: i64,

    pub created_at: DateTime<Utc>,
}

/// DTO for creating a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    /// Defaults to `["all"]`.
    pub categories: Option<Vec<String>>,
    /// Desired number of questions, clamped to the pool size.
    #[validate(range(min = 1))]
    pub count: Option<usize>,
    /// Seconds.
    #[validate(range(min = 1))]
    pub duration: Option<i64>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// Falls back to the caller's username.
    pub created_by: Option<String>,
    #[serde(default)]
    pub certificate_enabled: bool,
    #[serde(default)]
    pub certificate_template: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub certificate_passing_score: i64,
}

/// Certificate settings of a quiz.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CertificateOptions {
    pub enabled: bool,
    pub template: String,
    pub passing_score: i64,
}

/// Summary returned after creating a quiz.
#[derive(Debug, Clone, Serialize)]
pub struct QuizCreated {
    pub id: Uuid,
    pub title: String,
    pub num_questions: i64,
    pub duration: i64,
    /// Capitalized for display.
    pub categories: Vec<String>,
    pub certificate_enabled: bool,
    pub certificate_passing_score: i64,
}

/// Quiz info joined into result listings and returned by quiz listings.
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    pub id: Uuid,
    pub title: String,
    pub categories: Vec<String>,
    pub num_questions: i64,
    pub duration: i64,
    pub created_by: String,
    pub certificate_enabled: bool,
    pub certificate_passing_score: i64,
    pub created_at: DateTime<Utc>,
}

impl From<&Quiz> for QuizSummary {
    fn from(quiz: &Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title.clone(),
            categories: quiz.categories.clone(),
            num_questions: quiz.num_questions,
            duration: quiz.duration,
            created_by: quiz.created_by.clone(),
            certificate_enabled: quiz.certificate_enabled,
            certificate_passing_score: quiz.certificate_passing_score,
            created_at: quiz.created_at,
        }
    }
}

/// A quiz ready to be attempted: questions in presentation order, answers withheld.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptQuiz {
    pub id: Uuid,
    pub title: String,
    pub categories: Vec<String>,
    pub num_questions: i64,
    pub duration: i64,
    pub description: String,
    pub created_by: String,
    pub questions: Vec<PublicQuestion>,
    pub certificate_enabled: bool,
    pub certificate_template: String,
    pub certificate_passing_score: i64,
}

/// A practice quiz. Never persisted; answers included for self-grading.
#[derive(Debug, Clone, Serialize)]
pub struct DemoQuiz {
    pub id: String,
    pub title: String,
    pub categories: Vec<String>,
    pub num_questions: i64,
    pub duration: i64,
    pub created_by: String,
    pub questions: Vec<Question>,
    pub demo: bool,
}

/// "quantitative" -> "Quantitative".
pub fn display_category(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
