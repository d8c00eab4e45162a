// src/handlers/quizzes.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    config::{DEFAULT_DURATION_SECONDS, DEFAULT_QUESTION_COUNT},
    error::AppError,
    extractors::AppJson,
    models::quiz::{CertificateOptions, CreateQuizRequest, QuizCreated, QuizSummary, display_category},
    services::{
        assembler::{self, NewQuiz},
        server,
    },
    state::SharedStore,
    utils::{id::parse_id, jwt::Claims},
};

/// Creates a quiz from a random sample of the requested categories.
///
/// * `count` defaults to 10 and is clamped to the pool size.
/// * `created_by` defaults to the caller's username.
pub async fn create_quiz(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let new_quiz = NewQuiz {
        title: payload.title,
        categories: payload.categories.unwrap_or_default(),
        count: payload.count.unwrap_or(DEFAULT_QUESTION_COUNT),
        duration: payload.duration.unwrap_or(DEFAULT_DURATION_SECONDS),
        description: payload.description.unwrap_or_default(),
        created_by: payload
            .created_by
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or(claims.username),
        certificate: CertificateOptions {
            enabled: payload.certificate_enabled,
            template: payload.certificate_template,
            passing_score: payload.certificate_passing_score,
        },
    };

    let quiz = assembler::create_quiz(store.as_ref(), new_quiz).await?;

    Ok((
        StatusCode::CREATED,
        Json(QuizCreated {
            id: quiz.id,
            title: quiz.title,
            num_questions: quiz.num_questions,
            duration: quiz.duration,
            categories: quiz.categories.iter().map(|c| display_category(c)).collect(),
            certificate_enabled: quiz.certificate_enabled,
            certificate_passing_score: quiz.certificate_passing_score,
        }),
    ))
}

/// Lists quizzes, newest first.
pub async fn list_quizzes(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let quizzes = store.list_quizzes().await?;
    let summaries: Vec<QuizSummary> = quizzes.iter().map(QuizSummary::from).collect();
    Ok(Json(summaries))
}

/// Serves a quiz for an attempt: shuffled questions, no answers.
pub async fn get_quiz(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = server::get_quiz_for_attempt(store.as_ref(), &id).await?;
    Ok(Json(quiz))
}

/// Practice quiz over one category. Nothing is stored.
pub async fn demo_quiz(
    State(store): State<SharedStore>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = server::demo_quiz(store.as_ref(), &category).await?;
    Ok(Json(quiz))
}

/// Deletes a quiz. Results of the quiz are kept.
pub async fn delete_quiz(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "quiz")?;
    if !store.delete_quiz(id).await? {
        return Err(AppError::NotFound("Quiz not found".to_string()));
    }
    tracing::info!(quiz_id = %id, "Quiz deleted");
    Ok(StatusCode::NO_CONTENT)
}
