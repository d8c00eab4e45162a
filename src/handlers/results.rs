// src/handlers/results.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    extractors::AppJson,
    models::result::RecordResultRequest,
    services::{
        recorder::{self, Respondent},
        reporter,
    },
    state::SharedStore,
    utils::jwt::Claims,
};

/// Records a quiz attempt for the authenticated caller.
///
/// The answers are scored against the current bank and frozen into the result.
pub async fn record_result(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<RecordResultRequest>,
) -> Result<impl IntoResponse, AppError> {
    let respondent = Respondent {
        user_id: claims.user_id(),
        fallback_name: Some(claims.username),
    };

    let result = recorder::record_result(store.as_ref(), payload, respondent).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// All results, newest first.
/// Staff only.
pub async fn list_results(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(reporter::list_results(store.as_ref()).await?))
}

/// Leaderboard of one quiz.
pub async fn list_results_by_quiz(
    State(store): State<SharedStore>,
    Path(quiz_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(reporter::list_results_by_quiz(store.as_ref(), &quiz_id).await?))
}

pub async fn list_results_by_student(
    State(store): State<SharedStore>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(
        reporter::list_results_by_respondent(store.as_ref(), &name).await?,
    ))
}

pub async fn get_result(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(reporter::get_result_detail(store.as_ref(), &id).await?))
}

/// Admin only.
pub async fn delete_result(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    reporter::delete_result(store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
