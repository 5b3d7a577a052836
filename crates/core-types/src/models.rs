use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validator::Validator;

static EMAIL_RX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .ok()
});

// ==============================================================================
// Users
// ==============================================================================

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A registration request after decoding, before the password is hashed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(
        EMAIL_RX.as_ref().is_some_and(|rx| rx.is_match(email)),
        "email",
        "must be a valid email address",
    );
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(password.len() >= 8, "password", "must be at least 8 bytes long");
    v.check(password.len() <= 72, "password", "must not be more than 72 bytes long");
}

impl NewUser {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.name.is_empty(), "name", "must be provided");
        v.check(self.name.len() <= 500, "name", "must not be more than 500 bytes long");
        validate_email(v, &self.email);
        validate_password_plaintext(v, &self.password);
    }
}

// ==============================================================================
// Exercises
// ==============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Exercise {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub muscle_group: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The exercise fields joined onto workout and log items at read time.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct ExerciseSummary {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub muscle_group: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewExercise {
    pub name: String,
    pub description: String,
    pub category: String,
    pub muscle_group: String,
}

impl NewExercise {
    pub fn validate(&self, v: &mut Validator) {
        v.check(!self.name.is_empty(), "name", "must be provided");
        v.check(self.name.len() <= 100, "name", "must not be more than 100 bytes long");
        v.check(
            self.description.len() <= 1000,
            "description",
            "must not be more than 1000 bytes long",
        );
        v.check(!self.category.is_empty(), "category", "must be provided");
        v.check(self.category.len() <= 50, "category", "must not be more than 50 bytes long");
        v.check(!self.muscle_group.is_empty(), "muscle_group", "must be provided");
        v.check(
            self.muscle_group.len() <= 50,
            "muscle_group",
            "must not be more than 50 bytes long",
        );
    }
}

// ==============================================================================
// Workouts
// ==============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<DateTime<Utc>>,
    #[sqlx(skip)]
    pub items: Vec<WorkoutItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutItem {
    pub id: i64,
    pub workout_id: i64,
    pub exercise_id: i64,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<ExerciseSummary>,
}

/// One prescribed or performed exercise in a write request. Shared by workout
/// items and log items, which carry the same fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NewItem {
    pub exercise_id: i64,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
}

pub fn validate_items(v: &mut Validator, items: &[NewItem]) {
    for (i, item) in items.iter().enumerate() {
        v.check(item.exercise_id > 0, format!("items.{i}.exercise_id"), "must be provided");
        v.check(item.sets > 0, format!("items.{i}.sets"), "must be greater than zero");
        v.check(item.reps > 0, format!("items.{i}.reps"), "must be greater than zero");
        v.check(
            item.weight.is_finite() && item.weight >= 0.0,
            format!("items.{i}.weight"),
            "must not be negative",
        );
    }
}

/// A workout template to be written together with its items.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkout {
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub schedule: Option<DateTime<Utc>>,
    pub items: Vec<NewItem>,
}

fn validate_workout_fields(
    v: &mut Validator,
    name: &str,
    description: &str,
    schedule: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) {
    v.check(!name.is_empty(), "name", "must be provided");
    v.check(name.len() <= 100, "name", "must not be more than 100 bytes long");
    v.check(!description.is_empty(), "description", "must be provided");
    v.check(
        description.len() <= 1000,
        "description",
        "must not be more than 1000 bytes long",
    );
    if let Some(schedule) = schedule {
        v.check(schedule > now, "schedule", "must be in the future");
    }
}

impl NewWorkout {
    pub fn validate(&self, v: &mut Validator, now: DateTime<Utc>) {
        validate_workout_fields(v, &self.name, &self.description, self.schedule, now);
        validate_items(v, &self.items);
    }
}

/// A partial update to a workout. Absent fields keep their stored value; a
/// present `items` list replaces every existing item.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkoutPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schedule: Option<DateTime<Utc>>,
    pub items: Option<Vec<NewItem>>,
}

impl WorkoutPatch {
    /// Applies the scalar fields to `workout` and validates the result.
    ///
    /// The schedule is only required to be in the future when the patch sets
    /// it; a stored schedule that has since passed does not block other edits.
    pub fn apply(&self, workout: &mut Workout, v: &mut Validator, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            workout.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            workout.description.clone_from(description);
        }
        if self.schedule.is_some() {
            workout.schedule = self.schedule;
        }
        validate_workout_fields(v, &workout.name, &workout.description, self.schedule, now);
        if let Some(items) = &self.items {
            validate_items(v, items);
        }
    }
}

// ==============================================================================
// Workout logs
// ==============================================================================

#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct WorkoutLog {
    pub id: i64,
    pub workout_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    /// Minutes.
    pub duration: i32,
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub workout_name: String,
    #[sqlx(skip)]
    pub items: Vec<WorkoutLogItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkoutLogItem {
    pub id: i64,
    pub log_id: i64,
    pub exercise_id: i64,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<ExerciseSummary>,
}

/// A completed session to be written together with its items.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkoutLog {
    pub workout_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub duration: i32,
    pub notes: String,
    pub items: Vec<NewItem>,
}

impl NewWorkoutLog {
    pub fn validate(&self, v: &mut Validator) {
        v.check(self.workout_id > 0, "workout_id", "must be provided");
        v.check(self.duration > 0, "duration", "must be greater than zero");
        v.check(self.notes.len() <= 1000, "notes", "must not be more than 1000 bytes long");
        v.check(!self.items.is_empty(), "items", "must contain at least one item");
        validate_items(v, &self.items);
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn item(exercise_id: i64, sets: i32, reps: i32, weight: f64) -> NewItem {
        NewItem { exercise_id, sets, reps, weight }
    }

    #[test]
    fn workout_validation_reports_every_item_field() {
        let now = Utc::now();
        let workout = NewWorkout {
            user_id: 1,
            name: String::new(),
            description: "legs".into(),
            schedule: Some(now - Duration::hours(1)),
            items: vec![item(1, 3, 10, 50.0), item(0, 0, -1, -2.5)],
        };
        let mut v = Validator::new();
        workout.validate(&mut v, now);

        let errors = v.finish().unwrap_err();
        assert_eq!(errors["name"], "must be provided");
        assert_eq!(errors["schedule"], "must be in the future");
        assert_eq!(errors["items.1.exercise_id"], "must be provided");
        assert_eq!(errors["items.1.sets"], "must be greater than zero");
        assert_eq!(errors["items.1.reps"], "must be greater than zero");
        assert_eq!(errors["items.1.weight"], "must not be negative");
        assert!(!errors.contains_key("items.0.sets"));
    }

    #[test]
    fn patch_keeps_unset_fields_and_ignores_a_past_stored_schedule() {
        let now = Utc::now();
        let mut workout = Workout {
            id: 7,
            user_id: 1,
            name: "Push".into(),
            description: "chest and triceps".into(),
            schedule: Some(now - Duration::days(2)),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let patch = WorkoutPatch {
            name: Some("Push A".into()),
            ..WorkoutPatch::default()
        };
        let mut v = Validator::new();
        patch.apply(&mut workout, &mut v, now);

        assert!(v.valid());
        assert_eq!(workout.name, "Push A");
        assert_eq!(workout.description, "chest and triceps");
    }

    #[test]
    fn log_requires_items_and_positive_duration() {
        let log = NewWorkoutLog {
            workout_id: 0,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            duration: 0,
            notes: String::new(),
            items: Vec::new(),
        };
        let mut v = Validator::new();
        log.validate(&mut v);

        let errors = v.finish().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors["items"], "must contain at least one item");
    }

    #[test]
    fn registration_checks_email_and_password() {
        let user = NewUser {
            name: "Sam".into(),
            email: "not-an-email".into(),
            password: "short".into(),
        };
        let mut v = Validator::new();
        user.validate(&mut v);

        let errors = v.finish().unwrap_err();
        assert_eq!(errors["email"], "must be a valid email address");
        assert_eq!(errors["password"], "must be at least 8 bytes long");
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = User {
            id: 1,
            name: "Sam".into(),
            email: "sam@example.com".into(),
            password_hash: "$2b$12$secret".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
