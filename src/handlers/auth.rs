// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    extractors::AppJson,
    models::user::{CreateUserRequest, LoginRequest, Role, UpdateProfileRequest, User, UserSummary},
    state::SharedStore,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Claims, sign_jwt},
    },
};

/// Registers a new student, or a faculty member holding the faculty code.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created with a token and the user (excluding password).
pub async fn register(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = match payload.role.as_deref().map(str::trim) {
        None | Some("") | Some("student") => Role::Student,
        Some("faculty") => {
            let supplied = payload.faculty_code.as_deref().unwrap_or_default();
            match &config.faculty_code {
                Some(code) if code == supplied => Role::Faculty,
                _ => return Err(AppError::Forbidden("Invalid faculty code".to_string())),
            }
        }
        Some(other) => {
            return Err(AppError::BadRequest(format!("Invalid role: {}", other)));
        }
    };

    let hashed_password = hash_password(&payload.password)?;

    let user = store
        .insert_user(User {
            id: Uuid::new_v4(),
            username: payload.username.trim().to_string(),
            email: payload.email.trim().to_lowercase(),
            password: hashed_password,
            role,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "User registered: {}", user.username);

    let token = sign_jwt(
        user.id,
        &user.username,
        user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "token": token,
            "type": "Bearer",
            "user": UserSummary::from(&user),
        })),
    ))
}

/// Authenticates by username or email and returns a JWT token.
pub async fn login(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = store
        .find_user_by_login(payload.login.trim())
        .await?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.username,
        user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": UserSummary::from(&user),
    })))
}

/// Updates the caller's email and/or password.
/// The username and role cannot be changed here.
pub async fn update_profile(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty());
    let password = payload.password.filter(|p| !p.is_empty());
    if email.is_none() && password.is_none() {
        return Err(AppError::BadRequest(
            "At least one field (email or password) is required".to_string(),
        ));
    }

    let user_id = claims
        .user_id()
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    let mut user = store
        .find_users(&[user_id])
        .await?
        .pop()
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    if let Some(email) = email {
        if let Some(other) = store.find_user_by_login(&email).await? {
            if other.id != user.id {
                return Err(AppError::BadRequest("Email already in use".to_string()));
            }
        }
        user.email = email;
    }
    if let Some(password) = password {
        user.password = hash_password(&password)?;
    }

    if !store.update_user(&user).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = %user.id, "Profile updated: {}", user.username);

    Ok(Json(json!({
        "message": "Profile updated",
        "user": UserSummary::from(&user),
    })))
}
