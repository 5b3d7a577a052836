pub mod filters;
pub mod models;
pub mod validator;

// Re-export the core types to provide a clean public API.
pub use filters::{Filters, Metadata, SortSafelist, EXERCISE_SORT, WORKOUT_LOG_SORT, WORKOUT_SORT};
pub use models::{
    validate_email, validate_items, validate_password_plaintext, Exercise, ExerciseSummary,
    NewExercise, NewItem, NewUser, NewWorkout, NewWorkoutLog, User, Workout, WorkoutItem,
    WorkoutLog, WorkoutLogItem, WorkoutPatch,
};
pub use validator::{permitted_value, unique, ValidationErrors, Validator};
