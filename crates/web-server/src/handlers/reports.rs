use std::sync::Arc;

use analytics::{DateRange, ReportEngine};
use axum::{extract::State, response::IntoResponse, Json};
use chrono::Utc;
use core_types::{Filters, Validator, WORKOUT_LOG_SORT};
use database::WorkoutLogFilter;
use serde_json::json;

use crate::{context::AuthenticatedUser, error::AppError, extract::QueryParams, AppState};

/// Logs are fetched in pages of this size until the range is exhausted.
const REPORT_PAGE_SIZE: i64 = 100;

/// # GET /v1/reports/progress
///
/// `start_date` and `end_date` are `YYYY-MM-DD`; `exercise_id` narrows the
/// report to logs containing that exercise.
pub async fn progress_report(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    query: QueryParams,
) -> Result<impl IntoResponse, AppError> {
    let mut v = Validator::new();
    let range = DateRange::resolve(
        query.get("start_date"),
        query.get("end_date"),
        Utc::now().date_naive(),
        &mut v,
    );
    let exercise_id = match query.get("exercise_id").map(str::parse::<i64>) {
        None => None,
        Some(Ok(id)) if id > 0 => Some(id),
        Some(_) => {
            v.add_error("exercise_id", "must be a positive integer");
            None
        }
    };
    v.finish()?;

    let filter = WorkoutLogFilter {
        start_date: Some(range.start),
        end_date: Some(range.end),
        exercise_id,
    };
    let pages = Filters::new(1, REPORT_PAGE_SIZE, "-date", &WORKOUT_LOG_SORT)?;
    let logs = state.repo.all_workout_logs(user_id, &filter, pages).await?;

    let report = ReportEngine::new().summarize(range, exercise_id, logs);
    Ok(Json(json!({ "report": report })))
}
