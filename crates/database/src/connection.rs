use crate::error::DbError;
use configuration::DatabaseSettings;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Establishes a connection pool to the PostgreSQL database.
///
/// The pool is shared across the entire application; its acquire timeout is
/// the same deadline the repository applies to every operation.
pub async fn connect(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    let pool = pool_options(settings).connect(&settings.url).await?;
    Ok(pool)
}

/// Builds a pool that opens connections on first use.
///
/// Lets the HTTP layer be assembled (and exercised up to the point where a
/// handler touches the store) without a reachable database.
pub fn connect_lazy(settings: &DatabaseSettings) -> Result<PgPool, DbError> {
    pool_options(settings)
        .connect_lazy(&settings.url)
        .map_err(|e| DbError::ConnectionConfigError(e.to_string()))
}

fn pool_options(settings: &DatabaseSettings) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.query_timeout())
        .idle_timeout(Duration::from_secs(15 * 60))
}

/// Applies any pending migrations from `crates/database/migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
