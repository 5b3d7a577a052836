use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgPool;

use crate::DbError;

mod exercises;
mod items;
mod users;
mod workout_logs;
mod workouts;

pub use workout_logs::WorkoutLogFilter;

/// Deadline used when the caller does not supply one.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// The `DbRepository` provides a high-level, application-specific interface
/// to the database. It encapsulates all SQL queries and data access logic.
///
/// Every public operation runs under `query_timeout`. For the aggregate
/// writes the deadline covers the whole transaction; a transaction abandoned
/// by the deadline is dropped uncommitted and therefore rolled back.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs `op` under the repository deadline.
    async fn deadline<T, F>(&self, op: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        match tokio::time::timeout(self.query_timeout, op).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.query_timeout, "database operation deadline exceeded");
                Err(DbError::DeadlineExceeded(self.query_timeout))
            }
        }
    }
}
