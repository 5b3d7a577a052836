//! Child rows shared by workouts and workout logs.
//!
//! Both aggregates store items with the same columns; only the table and the
//! parent key differ. Reads join every item to its exercise.

use std::collections::HashMap;

use core_types::{ExerciseSummary, NewItem, WorkoutItem, WorkoutLogItem};
use sqlx::{FromRow, PgConnection};

use crate::DbError;

#[derive(Debug, Clone, Copy)]
pub(super) enum ItemTable {
    Workout,
    WorkoutLog,
}

impl ItemTable {
    fn insert_sql(self) -> &'static str {
        match self {
            ItemTable::Workout => {
                "INSERT INTO workout_items (workout_id, exercise_id, sets, reps, weight) \
                 VALUES ($1, $2, $3, $4, $5)"
            }
            ItemTable::WorkoutLog => {
                "INSERT INTO workout_log_items (log_id, exercise_id, sets, reps, weight) \
                 VALUES ($1, $2, $3, $4, $5)"
            }
        }
    }

    fn select_sql(self) -> &'static str {
        match self {
            ItemTable::Workout => {
                r#"
                SELECT i.id, i.workout_id AS parent_id, i.exercise_id, i.sets, i.reps, i.weight,
                       e.name AS exercise_name, e.description AS exercise_description,
                       e.category AS exercise_category, e.muscle_group AS exercise_muscle_group
                FROM workout_items i
                JOIN exercises e ON e.id = i.exercise_id
                WHERE i.workout_id = ANY($1)
                ORDER BY i.workout_id, i.id
                "#
            }
            ItemTable::WorkoutLog => {
                r#"
                SELECT i.id, i.log_id AS parent_id, i.exercise_id, i.sets, i.reps, i.weight,
                       e.name AS exercise_name, e.description AS exercise_description,
                       e.category AS exercise_category, e.muscle_group AS exercise_muscle_group
                FROM workout_log_items i
                JOIN exercises e ON e.id = i.exercise_id
                WHERE i.log_id = ANY($1)
                ORDER BY i.log_id, i.id
                "#
            }
        }
    }
}

/// One item row joined to its exercise.
#[derive(Debug, FromRow)]
pub(super) struct ItemRow {
    id: i64,
    parent_id: i64,
    exercise_id: i64,
    sets: i32,
    reps: i32,
    weight: f64,
    exercise_name: String,
    exercise_description: String,
    exercise_category: String,
    exercise_muscle_group: String,
}

impl ItemRow {
    fn exercise(&self) -> ExerciseSummary {
        ExerciseSummary {
            id: self.exercise_id,
            name: self.exercise_name.clone(),
            description: self.exercise_description.clone(),
            category: self.exercise_category.clone(),
            muscle_group: self.exercise_muscle_group.clone(),
        }
    }

    fn into_workout_item(self) -> WorkoutItem {
        WorkoutItem {
            exercise: Some(self.exercise()),
            id: self.id,
            workout_id: self.parent_id,
            exercise_id: self.exercise_id,
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
        }
    }

    fn into_log_item(self) -> WorkoutLogItem {
        WorkoutLogItem {
            exercise: Some(self.exercise()),
            id: self.id,
            log_id: self.parent_id,
            exercise_id: self.exercise_id,
            sets: self.sets,
            reps: self.reps,
            weight: self.weight,
        }
    }
}

/// Inserts `items` under `parent_id` inside the caller's transaction.
///
/// A foreign-key violation is reported against the position of the item
/// that caused it; the caller's transaction must then be abandoned.
pub(super) async fn insert_items(
    conn: &mut PgConnection,
    table: ItemTable,
    parent_id: i64,
    items: &[NewItem],
) -> Result<(), DbError> {
    for (index, item) in items.iter().enumerate() {
        sqlx::query(table.insert_sql())
            .bind(parent_id)
            .bind(item.exercise_id)
            .bind(item.sets)
            .bind(item.reps)
            .bind(item.weight)
            .execute(&mut *conn)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    DbError::UnknownExercise { item: index }
                }
                _ => DbError::QueryError(e),
            })?;
    }
    Ok(())
}

async fn fetch_rows(
    conn: &mut PgConnection,
    table: ItemTable,
    parent_ids: &[i64],
) -> Result<Vec<ItemRow>, DbError> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, ItemRow>(table.select_sql())
        .bind(parent_ids)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Loads the items of every workout in `workout_ids` with one query,
/// grouped by workout and ordered by item id.
pub(super) async fn fetch_workout_items(
    conn: &mut PgConnection,
    workout_ids: &[i64],
) -> Result<HashMap<i64, Vec<WorkoutItem>>, DbError> {
    let mut grouped: HashMap<i64, Vec<WorkoutItem>> = HashMap::new();
    for row in fetch_rows(conn, ItemTable::Workout, workout_ids).await? {
        grouped.entry(row.parent_id).or_default().push(row.into_workout_item());
    }
    Ok(grouped)
}

pub(super) async fn fetch_log_items(
    conn: &mut PgConnection,
    log_ids: &[i64],
) -> Result<HashMap<i64, Vec<WorkoutLogItem>>, DbError> {
    let mut grouped: HashMap<i64, Vec<WorkoutLogItem>> = HashMap::new();
    for row in fetch_rows(conn, ItemTable::WorkoutLog, log_ids).await? {
        grouped.entry(row.parent_id).or_default().push(row.into_log_item());
    }
    Ok(grouped)
}
