use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use core_types::ValidationErrors;
use database::DbError;
use serde_json::json;
use thiserror::Error;

pub const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";
pub const NOT_FOUND_MESSAGE: &str = "the requested resource could not be found";
pub const INVALID_TOKEN_MESSAGE: &str = "invalid or missing authentication token";
pub const INVALID_CREDENTIALS_MESSAGE: &str = "invalid authentication credentials";
pub const RATE_LIMITED_MESSAGE: &str = "rate limit exceeded";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(ValidationErrors),
    #[error("Invalid or missing authentication token")]
    InvalidToken,
    #[error("Invalid authentication credentials")]
    InvalidCredentials,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Not found")]
    NotFound,
    #[error("Method {0} not allowed")]
    MethodNotAllowed(Method),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::Validation(errors)
    }
}

fn server_error(cause: &dyn std::fmt::Display) -> (StatusCode, serde_json::Value) {
    tracing::error!(error = %cause, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, json!(SERVER_ERROR_MESSAGE))
}

fn single_field(key: String, message: &str) -> serde_json::Value {
    json!({ key: message })
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Every body is `{"error": ...}`. Server-side causes are logged here, inside
/// the request's trace span, and never echoed to the client.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Database(DbError::NotFound) | AppError::NotFound => {
                (StatusCode::NOT_FOUND, json!(NOT_FOUND_MESSAGE))
            }
            AppError::Database(DbError::UnknownExercise { item }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                single_field(format!("items.{item}.exercise_id"), "exercise not found"),
            ),
            AppError::Database(DbError::DuplicateEmail) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                single_field("email".to_string(), "a user with this email address already exists"),
            ),
            AppError::Database(db_err) => server_error(&db_err),
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, json!(message)),
            AppError::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, json!(errors)),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, json!(INVALID_TOKEN_MESSAGE)),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, json!(INVALID_CREDENTIALS_MESSAGE))
            }
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, json!(RATE_LIMITED_MESSAGE)),
            AppError::MethodNotAllowed(method) => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!(format!("the {method} method is not supported for this resource")),
            ),
            AppError::Internal(cause) => server_error(&cause),
        };

        let mut response = (status, Json(json!({ "error": error }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let cases = [
            (AppError::Database(DbError::NotFound), StatusCode::NOT_FOUND),
            (
                AppError::Database(DbError::DeadlineExceeded(std::time::Duration::from_secs(3))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AppError::Database(DbError::UnknownExercise { item: 2 }), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::BadRequest("body must not be empty".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED),
            (AppError::RateLimited, StatusCode::TOO_MANY_REQUESTS),
            (AppError::MethodNotAllowed(Method::PUT), StatusCode::METHOD_NOT_ALLOWED),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = AppError::InvalidToken.into_response();
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
