use core_types::User;

use super::DbRepository;
use crate::DbError;

impl DbRepository {
    /// Stores a new account. Emails are unique regardless of case.
    pub async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, DbError> {
        self.deadline(async {
            sqlx::query_as::<_, User>(
                "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) \
                 RETURNING id, name, email, password_hash, created_at",
            )
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => DbError::DuplicateEmail,
                _ => DbError::QueryError(e),
            })
        })
        .await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, DbError> {
        self.deadline(async {
            sqlx::query_as::<_, User>(
                "SELECT id, name, email, password_hash, created_at FROM users \
                 WHERE LOWER(email) = LOWER($1)",
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
        })
        .await
    }
}
