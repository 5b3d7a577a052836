use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{NaiveDate, Utc};
use core_types::{
    Filters, NewItem, NewWorkoutLog, ValidationErrors, Validator, WORKOUT_LOG_SORT,
};
use database::{DbError, WorkoutLogFilter};
use serde::Deserialize;
use serde_json::json;

use super::location;
use crate::{
    context::AuthenticatedUser,
    error::AppError,
    extract::{IdParam, JsonBody, QueryParams},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CreateWorkoutLogRequest {
    pub workout_id: i64,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
    /// Minutes.
    pub duration: i32,
    pub notes: String,
    pub items: Vec<NewItem>,
}

/// # POST /v1/workout-logs
pub async fn create_workout_log(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    JsonBody(input): JsonBody<CreateWorkoutLogRequest>,
) -> Result<impl IntoResponse, AppError> {
    let log = NewWorkoutLog {
        workout_id: input.workout_id,
        user_id,
        date: input.date.unwrap_or_else(|| Utc::now().date_naive()),
        duration: input.duration,
        notes: input.notes,
        items: input.items,
    };

    let mut v = Validator::new();
    log.validate(&mut v);
    v.finish()?;

    let log = match state.repo.insert_workout_log(&log).await {
        Ok(log) => log,
        Err(DbError::NotFound) => {
            return Err(AppError::Validation(ValidationErrors::from([(
                "workout_id".to_string(),
                "workout not found".to_string(),
            )])));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(log_id = log.id, workout_id = log.workout_id, user_id, "workout logged");
    Ok((
        StatusCode::CREATED,
        location(format!("/v1/workout-logs/{}", log.id)),
        Json(json!({ "workout_log": log })),
    ))
}

/// # GET /v1/workout-logs
pub async fn list_workout_logs(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    query: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Validator::new();
    let filters = Filters::from_query(&query.0, &WORKOUT_LOG_SORT, &mut v);
    v.finish()?;

    let (logs, metadata) = state
        .repo
        .list_workout_logs(user_id, &WorkoutLogFilter::default(), &filters)
        .await?;
    Ok(Json(json!({ "workout_logs": logs, "metadata": metadata })))
}

/// # GET /v1/workout-logs/:id
pub async fn show_workout_log(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    IdParam(id): IdParam,
) -> Result<impl IntoResponse, AppError> {
    let log = state.repo.get_workout_log(id, user_id).await?;
    Ok(Json(json!({ "workout_log": log })))
}
