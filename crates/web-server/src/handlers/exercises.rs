use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use core_types::{Filters, NewExercise, Validator, EXERCISE_SORT};
use serde_json::json;

use super::location;
use crate::{
    error::AppError,
    extract::{IdParam, JsonBody, QueryParams},
    AppState,
};

/// # GET /v1/exercises
///
/// Optional `category` and `muscle_group` match case-insensitively.
pub async fn list_exercises(
    State(state): State<Arc<AppState>>,
    query: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Validator::new();
    let filters = Filters::from_query(&query.0, &EXERCISE_SORT, &mut v);
    v.finish()?;

    let category = query.get("category").unwrap_or_default();
    let muscle_group = query.get("muscle_group").unwrap_or_default();
    let (exercises, metadata) = state
        .repo
        .list_exercises(category, muscle_group, &filters)
        .await?;

    Ok(Json(json!({ "exercises": exercises, "metadata": metadata })))
}

/// # POST /v1/exercises
pub async fn create_exercise(
    State(state): State<Arc<AppState>>,
    JsonBody(input): JsonBody<NewExercise>,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Validator::new();
    input.validate(&mut v);
    v.finish()?;

    let exercise = state.repo.insert_exercise(&input).await?;
    Ok((
        StatusCode::CREATED,
        location(format!("/v1/exercises/{}", exercise.id)),
        Json(json!({ "exercise": exercise })),
    ))
}

/// # GET /v1/exercises/:id
pub async fn show_exercise(
    State(state): State<Arc<AppState>>,
    IdParam(id): IdParam,
) -> Result<impl IntoResponse, AppError> {
    let exercise = state.repo.get_exercise(id).await?;
    Ok(Json(json!({ "exercise": exercise })))
}
