// src/services/server.rs

//! Serving quizzes to test-takers.

use std::collections::HashMap;

use chrono::Utc;
use rand::seq::SliceRandom;
use uuid::Uuid;

use crate::{
    config::{DEMO_DURATION_SECONDS, DEMO_QUESTION_COUNT},
    error::AppError,
    models::{
        question::{ALL_CATEGORIES, Category, CategoryFilter, PublicQuestion, Question},
        quiz::{AttemptQuiz, DemoQuiz, display_category},
    },
    services::assembler::sample_ids,
    store::{QuestionStore, QuizStore},
    utils::id::parse_id,
};

/// Lines fetched questions up with `ids`, dropping ids that did not resolve.
/// Relative order of the remaining ids is kept.
pub fn resolve_in_order(ids: &[Uuid], found: Vec<Question>) -> Vec<Question> {
    let mut by_id: HashMap<Uuid, Question> = found.into_iter().map(|q| (q.id, q)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

/// Loads a quiz with its questions in a fresh random order and answers withheld.
pub async fn get_quiz_for_attempt<S>(store: &S, raw_id: &str) -> Result<AttemptQuiz, AppError>
where
    S: QuestionStore + QuizStore + ?Sized,
{
    let quiz_id = parse_id(raw_id, "quiz")?;

    let quiz = store
        .find_quiz(quiz_id)
        .await?
        .ok_or(AppError::NotFound("Quiz not found".to_string()))?;

    let found = store.find_questions(&quiz.question_ids).await?;
    let mut questions = resolve_in_order(&quiz.question_ids, found);

    if questions.len() < quiz.question_ids.len() {
        tracing::warn!(
            quiz_id = %quiz.id,
            missing = quiz.question_ids.len() - questions.len(),
            "Quiz references deleted questions"
        );
    }

    if questions.is_empty() {
        return Err(AppError::NotFound(
            "No questions found for this quiz".to_string(),
        ));
    }

    questions.shuffle(&mut rand::rng());

    tracing::debug!(quiz_id = %quiz.id, count = questions.len(), "Serving quiz");

    Ok(AttemptQuiz {
        id: quiz.id,
        title: quiz.title,
        categories: quiz.categories.iter().map(|c| display_category(c)).collect(),
        num_questions: quiz.num_questions,
        duration: quiz.duration,
        description: quiz.description,
        created_by: quiz.created_by,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
        certificate_enabled: quiz.certificate_enabled,
        certificate_template: quiz.certificate_template,
        certificate_passing_score: quiz.certificate_passing_score,
    })
}

/// Practice quiz over one category (or `all`). Nothing is persisted.
pub async fn demo_quiz<S>(store: &S, raw_category: &str) -> Result<DemoQuiz, AppError>
where
    S: QuestionStore + ?Sized,
{
    let normalized = raw_category.trim().to_lowercase();
    let filter = if normalized == ALL_CATEGORIES {
        CategoryFilter::All
    } else {
        let category = normalized
            .parse::<Category>()
            .map_err(|_| AppError::BadRequest("Invalid category".to_string()))?;
        CategoryFilter::Only(vec![category])
    };

    let pool = store.question_ids(&filter).await?;
    if pool.is_empty() {
        return Err(AppError::NotFound(
            "No questions available in this category".to_string(),
        ));
    }

    let picked = sample_ids(pool, DEMO_QUESTION_COUNT, &mut rand::rng());
    let found = store.find_questions(&picked).await?;
    let questions = resolve_in_order(&picked, found);

    Ok(DemoQuiz {
        id: format!("demo_{}", Utc::now().timestamp_millis()),
        title: format!("Demo Quiz ({})", raw_category.trim()),
        categories: vec![normalized],
        num_questions: questions.len() as i64,
        duration: DEMO_DURATION_SECONDS,
        created_by: "system".to_string(),
        questions,
        demo: true,
    })
}
