// src/models/question.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Sentinel tag meaning "no category filter".
pub const ALL_CATEGORIES: &str = "all";

/// Fixed set of question categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Quantitative,
    Logical,
    Verbal,
    Numerical,
    Spatial,
    Mechanical,
    Technical,
    Reasoning,
    General,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Quantitative,
        Category::Logical,
        Category::Verbal,
        Category::Numerical,
        Category::Spatial,
        Category::Mechanical,
        Category::Technical,
        Category::Reasoning,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Quantitative => "quantitative",
            Category::Logical => "logical",
            Category::Verbal => "verbal",
            Category::Numerical => "numerical",
            Category::Spatial => "spatial",
            Category::Mechanical => "mechanical",
            Category::Technical => "technical",
            Category::Reasoning => "reasoning",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Case-insensitive, surrounding whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or(normalized)
    }
}

/// A category filter: either every question, or a set of categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Only(Vec<Category>),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(categories) => categories.contains(&category),
        }
    }
}

/// Where a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    #[default]
    Manual,
    Import,
}

impl QuestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionSource::Manual => "manual",
            QuestionSource::Import => "import",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(QuestionSource::Manual),
            "import" => Some(QuestionSource::Import),
            _ => None,
        }
    }
}

/// A question in the bank. Serialized in full (including `answer`) only on
/// staff-facing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: Uuid,

    /// The prompt text. Unique across the bank.
    pub question: String,

    /// Ordered answer options.
    pub options: Vec<String>,

    /// Text of the correct option.
    pub answer: String,

    pub category: Category,

    #[serde(default)]
    pub explanation: String,

    #[serde(default)]
    pub source: QuestionSource,

    /// Import batch this question arrived with, if any.
    pub batch_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for sending a question to a test-taker. Has no answer field.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub category: Category,
    pub explanation: String,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question: q.question,
            options: q.options,
            category: q.category,
            explanation: q.explanation,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    /// Defaults to `general`.
    pub category: Option<String>,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question: Option<String>,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    #[validate(length(min = 1, max = 500))]
    pub answer: Option<String>,
    pub category: Option<String>,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
}

/// Query string of the question listing.
#[derive(Debug, Deserialize)]
pub struct QuestionListParams {
    pub category: Option<String>,
}

/// One row of a bulk import, shaped like a spreadsheet line.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportRow {
    pub question: Option<String>,
    pub option1: Option<String>,
    pub option2: Option<String>,
    pub option3: Option<String>,
    pub option4: Option<String>,
    pub answer: Option<String>,
    pub category: Option<String>,
    pub explanation: Option<String>,
}

/// DTO for a bulk import.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportQuestionsRequest {
    /// Free-text name of the imported sheet.
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub rows: Vec<ImportRow>,
}

/// Metadata of one bulk import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportBatch {
    pub id: Uuid,
    pub original_name: String,
    pub uploaded_by: String,
    pub inserted: i64,
    pub skipped: i64,
    pub uploaded_at: DateTime<Utc>,
}

/// Trims every option and drops the blank ones.
pub fn clean_options(options: &[String]) -> Vec<String> {
    options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if clean_options(options).len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_options"));
    }
    for opt in options {
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}
