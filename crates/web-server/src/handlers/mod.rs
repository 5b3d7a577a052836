//! Route handlers. Each returns a single-key JSON envelope on success and an
//! [`AppError`] otherwise.

use axum::http::header;

use crate::error::AppError;

pub mod exercises;
pub mod health;
pub mod reports;
pub mod users;
pub mod workout_logs;
pub mod workouts;

/// Fallback for paths no route matches.
pub async fn not_found() -> AppError {
    AppError::NotFound
}

/// `Location` header pointing at a newly created resource.
fn location(path: String) -> [(header::HeaderName, String); 1] {
    [(header::LOCATION, path)]
}
