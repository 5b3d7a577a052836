use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use core_types::{validate_email, validate_password_plaintext, NewUser, Validator};
use database::DbError;
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, extract::JsonBody, AppState};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
}

async fn password_matches(password: String, hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("password check task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("password check failed: {e}")))
}

/// # POST /v1/users
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<NewUser>,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Validator::new();
    input.validate(&mut v);
    v.finish()?;

    let password_hash = hash_password(input.password).await?;
    let user = state
        .repo
        .insert_user(&input.name, &input.email, &password_hash)
        .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

/// # POST /v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    v.finish()?;

    let user = match state.repo.get_user_by_email(&input.email).await {
        Ok(user) => user,
        Err(DbError::NotFound) => return Err(AppError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    if !password_matches(input.password, user.password_hash.clone()).await? {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "authentication_token": token })),
    ))
}
