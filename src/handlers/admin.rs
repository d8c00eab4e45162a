// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::user::{Role, Summary, UserSummary},
    state::SharedStore,
    utils::{id::parse_id, jwt::Claims},
};

/// Lists all users in the system, newest first.
/// Admin only.
pub async fn list_users(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let users = store.list_users().await?;
    let users: Vec<UserSummary> = users.iter().map(UserSummary::from).collect();
    Ok(Json(users))
}

/// Deletes a user by ID.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, "user")?;

    if claims.user_id() == Some(id) {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    if !store.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %id, by = %claims.username, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Dashboard counters.
/// Admin only.
pub async fn summary(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let summary = Summary {
        total_users: store.count_users(None).await?,
        total_admins: store.count_users(Some(Role::Admin)).await?,
        total_faculties: store.count_users(Some(Role::Faculty)).await?,
        total_students: store.count_users(Some(Role::Student)).await?,
        total_quizzes: store.count_quizzes().await?,
        total_results: store.count_results().await?,
    };
    Ok(Json(summary))
}
