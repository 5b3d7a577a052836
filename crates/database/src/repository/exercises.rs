use core_types::{Exercise, Filters, Metadata, NewExercise};
use sqlx::FromRow;

use super::DbRepository;
use crate::DbError;

const EXERCISE_COLUMNS: &str =
    "id, name, description, category, muscle_group, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ExercisePageRow {
    total_records: i64,
    #[sqlx(flatten)]
    exercise: Exercise,
}

impl DbRepository {
    pub async fn insert_exercise(&self, exercise: &NewExercise) -> Result<Exercise, DbError> {
        self.deadline(async {
            let sql = format!(
                "INSERT INTO exercises (name, description, category, muscle_group) \
                 VALUES ($1, $2, $3, $4) RETURNING {EXERCISE_COLUMNS}"
            );
            let row = sqlx::query_as::<_, Exercise>(&sql)
                .bind(&exercise.name)
                .bind(&exercise.description)
                .bind(&exercise.category)
                .bind(&exercise.muscle_group)
                .fetch_one(&self.pool)
                .await?;
            Ok(row)
        })
        .await
    }

    pub async fn get_exercise(&self, id: i64) -> Result<Exercise, DbError> {
        if id < 1 {
            return Err(DbError::NotFound);
        }
        self.deadline(async {
            let sql = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1");
            sqlx::query_as::<_, Exercise>(&sql)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(DbError::NotFound)
        })
        .await
    }

    /// Lists the exercise catalog. Empty `category` or `muscle_group` means
    /// "any"; otherwise the match is case-insensitive equality.
    pub async fn list_exercises(
        &self,
        category: &str,
        muscle_group: &str,
        filters: &Filters,
    ) -> Result<(Vec<Exercise>, Metadata), DbError> {
        self.deadline(async {
            let sql = format!(
                r#"
                SELECT COUNT(*) OVER() AS total_records, {EXERCISE_COLUMNS}
                FROM exercises
                WHERE (LOWER(category) = LOWER($1) OR $1 = '')
                  AND (LOWER(muscle_group) = LOWER($2) OR $2 = '')
                ORDER BY {}
                LIMIT $3 OFFSET $4
                "#,
                filters.order_by()
            );
            let rows = sqlx::query_as::<_, ExercisePageRow>(&sql)
                .bind(category)
                .bind(muscle_group)
                .bind(filters.limit())
                .bind(filters.offset())
                .fetch_all(&self.pool)
                .await?;

            let total = rows.first().map_or(0, |r| r.total_records);
            let metadata = Metadata::calculate(total, filters.page(), filters.page_size());
            Ok((rows.into_iter().map(|r| r.exercise).collect(), metadata))
        })
        .await
    }
}
