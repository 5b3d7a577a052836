use chrono::NaiveDate;
use core_types::{Filters, Metadata, NewWorkoutLog, WorkoutLog};
use sqlx::FromRow;

use super::DbRepository;
use super::items::{fetch_log_items, insert_items, ItemTable};
use crate::DbError;

const LOG_COLUMNS: &str = "wl.id, wl.workout_id, wl.user_id, wl.date, wl.duration, wl.notes, \
                           w.name AS workout_name, wl.created_at";

/// Optional narrowing of a workout log listing. Dates are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkoutLogFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Keep only logs with at least one item for this exercise.
    pub exercise_id: Option<i64>,
}

#[derive(Debug, FromRow)]
struct LogPageRow {
    total_records: i64,
    #[sqlx(flatten)]
    log: WorkoutLog,
}

impl DbRepository {
    /// Records a completed session and its items in one transaction.
    ///
    /// The parent row is only written when the referenced workout belongs to
    /// the same user; otherwise nothing is written and the result is `NotFound`.
    pub async fn insert_workout_log(&self, log: &NewWorkoutLog) -> Result<WorkoutLog, DbError> {
        let id = self
            .deadline(async {
                let mut tx = self.pool.begin().await?;

                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO workout_logs (workout_id, user_id, date, duration, notes)
                    SELECT $1, $2, $3, $4, $5
                    WHERE EXISTS (SELECT 1 FROM workouts WHERE id = $1 AND user_id = $2)
                    RETURNING id
                    "#,
                )
                .bind(log.workout_id)
                .bind(log.user_id)
                .bind(log.date)
                .bind(log.duration)
                .bind(&log.notes)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(DbError::NotFound)?;

                insert_items(&mut tx, ItemTable::WorkoutLog, id, &log.items).await?;

                tx.commit().await?;
                Ok(id)
            })
            .await?;

        tracing::debug!(log_id = id, workout_id = log.workout_id, "workout log recorded");
        self.get_workout_log(id, log.user_id).await
    }

    pub async fn get_workout_log(&self, id: i64, user_id: i64) -> Result<WorkoutLog, DbError> {
        if id < 1 {
            return Err(DbError::NotFound);
        }
        self.deadline(async {
            let mut conn = self.pool.acquire().await?;
            let sql = format!(
                "SELECT {LOG_COLUMNS} FROM workout_logs wl \
                 JOIN workouts w ON w.id = wl.workout_id \
                 WHERE wl.id = $1 AND wl.user_id = $2"
            );
            let mut log = sqlx::query_as::<_, WorkoutLog>(&sql)
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or(DbError::NotFound)?;

            let mut items = fetch_log_items(&mut conn, &[id]).await?;
            log.items = items.remove(&id).unwrap_or_default();
            Ok(log)
        })
        .await
    }

    /// Lists one page of the owner's logs, each with its items.
    pub async fn list_workout_logs(
        &self,
        user_id: i64,
        filter: &WorkoutLogFilter,
        filters: &Filters,
    ) -> Result<(Vec<WorkoutLog>, Metadata), DbError> {
        self.deadline(async {
            let mut conn = self.pool.acquire().await?;
            let sql = format!(
                r#"
                SELECT COUNT(*) OVER() AS total_records, {LOG_COLUMNS}
                FROM workout_logs wl
                JOIN workouts w ON w.id = wl.workout_id
                WHERE wl.user_id = $1
                  AND ($2::date IS NULL OR wl.date >= $2)
                  AND ($3::date IS NULL OR wl.date <= $3)
                  AND ($4::bigint IS NULL OR EXISTS (
                        SELECT 1 FROM workout_log_items li
                        WHERE li.log_id = wl.id AND li.exercise_id = $4))
                ORDER BY {}
                LIMIT $5 OFFSET $6
                "#,
                filters.order_by()
            );
            let rows = sqlx::query_as::<_, LogPageRow>(&sql)
                .bind(user_id)
                .bind(filter.start_date)
                .bind(filter.end_date)
                .bind(filter.exercise_id)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&mut *conn)
                .await?;

            let total = rows.first().map_or(0, |r| r.total_records);
            let mut logs: Vec<WorkoutLog> = rows.into_iter().map(|r| r.log).collect();

            let ids: Vec<i64> = logs.iter().map(|l| l.id).collect();
            let mut items = fetch_log_items(&mut conn, &ids).await?;
            for log in &mut logs {
                log.items = items.remove(&log.id).unwrap_or_default();
            }

            let metadata = Metadata::calculate(total, filters.page(), filters.page_size());
            Ok((logs, metadata))
        })
        .await
    }

    /// Fetches every log matching `filter`, walking the pages of `filters`
    /// until the last one. Each page runs under its own deadline.
    pub async fn all_workout_logs(
        &self,
        user_id: i64,
        filter: &WorkoutLogFilter,
        filters: Filters,
    ) -> Result<Vec<WorkoutLog>, DbError> {
        let mut page = filters;
        let mut logs = Vec::new();
        loop {
            let (mut batch, metadata) = self.list_workout_logs(user_id, filter, &page).await?;
            logs.append(&mut batch);
            if metadata.current_page >= metadata.last_page {
                break;
            }
            page = page.with_page(metadata.current_page + 1);
        }
        Ok(logs)
    }
}
