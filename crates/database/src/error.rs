use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to create the connection pool: {0}")]
    ConnectionConfigError(String),

    #[error("Database query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Database operation did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    /// No row matched the identity (and, for owned rows, the owner) predicate.
    #[error("The requested data was not found in the database.")]
    NotFound,

    /// An item in a write referenced an exercise that does not exist.
    /// `item` is the zero-based position of the offending item in the request.
    #[error("Item {item} references an unknown exercise.")]
    UnknownExercise { item: usize },

    #[error("A user with this email address already exists.")]
    DuplicateEmail,
}
