// src/handlers/questions.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    extractors::AppJson,
    models::question::{
        CreateQuestionRequest, ImportQuestionsRequest, QuestionListParams, UpdateQuestionRequest,
    },
    services::bank,
    state::SharedStore,
    utils::jwt::Claims,
};

/// Lists the question bank, optionally filtered by `?category=`.
/// Staff only. Answers included.
pub async fn list_questions(
    State(store): State<SharedStore>,
    Query(params): Query<QuestionListParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions = bank::list_questions(store.as_ref(), params.category.as_deref()).await?;
    Ok(Json(questions))
}

/// Adds a single question. 409 when the text already exists.
pub async fn create_question(
    State(store): State<SharedStore>,
    AppJson(payload): AppJson<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = bank::create_question(store.as_ref(), payload).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn update_question(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = bank::update_question(store.as_ref(), &id, payload).await?;
    Ok(Json(question))
}

pub async fn delete_question(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    bank::delete_question(store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Removes every question and every import batch.
/// Admin only.
pub async fn delete_all_questions(
    State(store): State<SharedStore>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = bank::delete_all_questions(store.as_ref()).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// Bulk import of spreadsheet-shaped rows under one batch.
pub async fn import_questions(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<ImportQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let report =
        bank::import_questions(store.as_ref(), payload.name, &payload.rows, &claims.username)
            .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list_batches(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let batches = store.list_batches().await?;
    Ok(Json(batches))
}

/// Deletes an import batch and every question it imported.
pub async fn delete_batch(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = bank::delete_batch(store.as_ref(), &id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}
