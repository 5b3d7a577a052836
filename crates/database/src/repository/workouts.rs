use core_types::{Filters, Metadata, NewItem, NewWorkout, Workout};
use sqlx::FromRow;

use super::DbRepository;
use super::items::{fetch_workout_items, insert_items, ItemTable};
use crate::DbError;

const WORKOUT_COLUMNS: &str = "id, user_id, name, description, schedule, created_at, updated_at";

#[derive(Debug, FromRow)]
struct WorkoutPageRow {
    total_records: i64,
    #[sqlx(flatten)]
    workout: Workout,
}

impl DbRepository {
    /// Writes a workout and all of its items in one transaction and returns
    /// the stored aggregate. Either every row is written or none is.
    pub async fn insert_workout(&self, workout: &NewWorkout) -> Result<Workout, DbError> {
        let id = self
            .deadline(async {
                let mut tx = self.pool.begin().await?;

                let id: i64 = sqlx::query_scalar(
                    "INSERT INTO workouts (user_id, name, description, schedule) \
                     VALUES ($1, $2, $3, $4) RETURNING id",
                )
                .bind(workout.user_id)
                .bind(&workout.name)
                .bind(&workout.description)
                .bind(workout.schedule)
                .fetch_one(&mut *tx)
                .await?;

                insert_items(&mut tx, ItemTable::Workout, id, &workout.items).await?;

                tx.commit().await?;
                Ok(id)
            })
            .await?;

        tracing::debug!(workout_id = id, items = workout.items.len(), "workout created");
        self.get_workout(id, workout.user_id).await
    }

    /// Reads one workout owned by `user_id` with its items.
    pub async fn get_workout(&self, id: i64, user_id: i64) -> Result<Workout, DbError> {
        if id < 1 {
            return Err(DbError::NotFound);
        }
        self.deadline(async {
            let mut conn = self.pool.acquire().await?;
            let sql = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1 AND user_id = $2");
            let mut workout = sqlx::query_as::<_, Workout>(&sql)
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(DbError::NotFound)?;

            let mut items = fetch_workout_items(&mut conn, &[id]).await?;
            workout.items = items.remove(&id).unwrap_or_default();
            Ok(workout)
        })
        .await
    }

    /// Lists one page of the owner's workouts, each with its items.
    pub async fn list_workouts(
        &self,
        user_id: i64,
        filters: &Filters,
    ) -> Result<(Vec<Workout>, Metadata), DbError> {
        self.deadline(async {
            let mut conn = self.pool.acquire().await?;
            let sql = format!(
                r#"
                SELECT COUNT(*) OVER() AS total_records, {WORKOUT_COLUMNS}
                FROM workouts
                WHERE user_id = $1
                ORDER BY {}
                LIMIT $2 OFFSET $3
                "#,
                filters.order_by()
            );
            let rows = sqlx::query_as::<_, WorkoutPageRow>(&sql)
                .bind(user_id)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&mut *conn)
                .await?;

            let total = rows.first().map_or(0, |r| r.total_records);
            let mut workouts: Vec<Workout> = rows.into_iter().map(|r| r.workout).collect();

            let ids: Vec<i64> = workouts.iter().map(|w| w.id).collect();
            let mut items = fetch_workout_items(&mut conn, &ids).await?;
            for workout in &mut workouts {
                workout.items = items.remove(&workout.id).unwrap_or_default();
            }

            let metadata = Metadata::calculate(total, filters.page(), filters.page_size());
            Ok((workouts, metadata))
        })
        .await
    }

    /// Persists the scalar fields of `workout` and, when `items` is given,
    /// replaces every existing item with the new list. One transaction;
    /// a workout not owned by `workout.user_id` is `NotFound`.
    pub async fn update_workout(
        &self,
        workout: &Workout,
        items: Option<&[NewItem]>,
    ) -> Result<Workout, DbError> {
        self.deadline(async {
            let mut tx = self.pool.begin().await?;

            sqlx::query_scalar::<_, i64>(
                "UPDATE workouts SET name = $1, description = $2, schedule = $3, updated_at = NOW() \
                 WHERE id = $4 AND user_id = $5 RETURNING id",
            )
            .bind(&workout.name)
            .bind(&workout.description)
            .bind(workout.schedule)
            .bind(workout.id)
            .bind(workout.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

            if let Some(items) = items {
                sqlx::query("DELETE FROM workout_items WHERE workout_id = $1")
                    .bind(workout.id)
                    .execute(&mut *tx)
                    .await?;
                insert_items(&mut tx, ItemTable::Workout, workout.id, items).await?;
            }

            tx.commit().await?;
            Ok(())
        })
        .await?;

        self.get_workout(workout.id, workout.user_id).await
    }

    /// Deletes a workout and its items. Logs of the workout go with it.
    pub async fn delete_workout(&self, id: i64, user_id: i64) -> Result<(), DbError> {
        if id < 1 {
            return Err(DbError::NotFound);
        }
        self.deadline(async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                "DELETE FROM workout_items WHERE workout_id = \
                 (SELECT id FROM workouts WHERE id = $1 AND user_id = $2)",
            )
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            let result = sqlx::query("DELETE FROM workouts WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(DbError::NotFound);
            }

            tx.commit().await?;
            Ok(())
        })
        .await
    }
}
