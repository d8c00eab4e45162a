// src/services/assembler.rs

//! Quiz assembly: category validation, pool building and random sampling.

use chrono::Utc;
use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        question::{ALL_CATEGORIES, Category, CategoryFilter},
        quiz::{CertificateOptions, Quiz},
    },
    store::{QuestionStore, QuizStore},
};

/// Input of `create_quiz`, already stripped of transport concerns.
#[derive(Debug, Clone)]
pub struct NewQuiz {
    pub title: Option<String>,
    pub categories: Vec<String>,
    pub count: usize,
    pub duration: i64,
    pub description: String,
    pub created_by: String,
    pub certificate: CertificateOptions,
}

/// Trims and lowercases the tags and checks them against the allowed set.
///
/// Returns the normalized tags (empty input becomes `["all"]`) together with
/// the filter they describe. Every invalid tag is listed in the error.
pub fn normalize_categories(raw: &[String]) -> Result<(Vec<String>, CategoryFilter), AppError> {
    let mut tags: Vec<String> = raw.iter().map(|c| c.trim().to_lowercase()).collect();
    if tags.is_empty() {
        tags.push(ALL_CATEGORIES.to_string());
    }

    let mut parsed = Vec::new();
    let mut invalid = Vec::new();
    for tag in &tags {
        if tag == ALL_CATEGORIES {
            continue;
        }
        match tag.parse::<Category>() {
            Ok(category) => parsed.push(category),
            Err(bad) => invalid.push(bad),
        }
    }

    if !invalid.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Invalid categories: {}",
            invalid.join(", ")
        )));
    }

    let filter = if tags.iter().any(|t| t == ALL_CATEGORIES) {
        CategoryFilter::All
    } else {
        CategoryFilter::Only(parsed)
    };
    Ok((tags, filter))
}

/// Uniform sample without replacement: Fisher-Yates shuffle, then take.
/// Asking for more than the pool holds returns the whole (shuffled) pool.
pub fn sample_ids<R: Rng + ?Sized>(mut pool: Vec<Uuid>, count: usize, rng: &mut R) -> Vec<Uuid> {
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// Builds and persists a quiz from a random subset of the category pool.
pub async fn create_quiz<S>(store: &S, new_quiz: NewQuiz) -> Result<Quiz, AppError>
where
    S: QuestionStore + QuizStore + ?Sized,
{
    if new_quiz.count == 0 {
        return Err(AppError::BadRequest(
            "Question count must be at least 1".to_string(),
        ));
    }

    let (categories, filter) = normalize_categories(&new_quiz.categories)?;

    let pool = store.question_ids(&filter).await?;
    if pool.is_empty() {
        return Err(AppError::BadRequest(
            "No questions available for chosen categories".to_string(),
        ));
    }

    let pool_size = pool.len();
    let question_ids = sample_ids(pool, new_quiz.count, &mut rand::rng());

    let title = new_quiz
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Quiz ({})", categories.join(", ")));

    let quiz = Quiz {
        id: Uuid::new_v4(),
        title,
        categories,
        num_questions: question_ids.len() as i64,
        question_ids,
        duration: new_quiz.duration,
        description: new_quiz.description,
        created_by: new_quiz.created_by,
        certificate_enabled: new_quiz.certificate.enabled,
        certificate_template: new_quiz.certificate.template,
        certificate_passing_score: new_quiz.certificate.passing_score,
        created_at: Utc::now(),
    };

    let quiz = store.insert_quiz(quiz).await?;

    tracing::info!(
        quiz_id = %quiz.id,
        pool_size,
        requested = new_quiz.count,
        selected = quiz.num_questions,
        "Quiz created: {}",
        quiz.title
    );

    Ok(quiz)
}
