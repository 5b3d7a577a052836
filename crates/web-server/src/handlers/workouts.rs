use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use core_types::{Filters, NewItem, NewWorkout, Validator, WorkoutPatch, WORKOUT_SORT};
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
pub struct CreateWorkoutRequest {
    pub name: String,
    pub description: String,
    pub schedule: Option<DateTime<Utc>>,
    pub items: Vec<NewItem>,
}

/// # GET /v1/workouts
pub async fn list_workouts(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    query: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Validator::new();
    let filters = Filters::from_query(&query.0, &WORKOUT_SORT, &mut v);
    v.finish()?;

    let (workouts, metadata) = state.repo.list_workouts(user_id, &filters).await?;
    Ok(Json(json!({ "workouts": workouts, "metadata": metadata })))
}

/// # POST /v1/workouts
pub async fn create_workout(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    JsonBody(input): JsonBody<CreateWorkoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let workout = NewWorkout {
        user_id,
        name: input.name,
        description: input.description,
        schedule: input.schedule,
        items: input.items,
    };

    let mut v = Validator::new();
    workout.validate(&mut v, Utc::now());
    v.finish()?;

    let workout = state.repo.insert_workout(&workout).await?;
    tracing::info!(workout_id = workout.id, user_id, "workout created");
    Ok((
        StatusCode::CREATED,
        location(format!("/v1/workouts/{}", workout.id)),
        Json(json!({ "workout": workout })),
    ))
}

/// # GET /v1/workouts/:id
pub async fn show_workout(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    IdParam(id): IdParam,
) -> Result<impl IntoResponse, AppError> {
    let workout = state.repo.get_workout(id, user_id).await?;
    Ok(Json(json!({ "workout": workout })))
}

/// # PATCH /v1/workouts/:id
///
/// Absent fields keep their value; a present `items` list replaces all items.
pub async fn update_workout(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    IdParam(id): IdParam,
    JsonBody(patch): JsonBody<WorkoutPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mut workout = state.repo.get_workout(id, user_id).await?;

    let mut v = Validator::new();
    patch.apply(&mut workout, &mut v, Utc::now());
    v.finish()?;

    let workout = state
        .repo
        .update_workout(&workout, patch.items.as_deref())
        .await?;
    Ok(Json(json!({ "workout": workout })))
}

/// # DELETE /v1/workouts/:id
pub async fn delete_workout(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    IdParam(id): IdParam,
) -> Result<impl IntoResponse, AppError> {
    state.repo.delete_workout(id, user_id).await?;
    tracing::info!(workout_id = id, user_id, "workout deleted");
    Ok(Json(json!({ "message": "workout successfully deleted" })))
}
