use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use core_types::{Validator, WorkoutLog};
use serde::Serialize;

/// Wire format of `start_date` / `end_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Days covered by the report when no start date is given.
pub const DEFAULT_WINDOW_DAYS: u64 = 30;

/// An inclusive calendar range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Resolves the requested bounds, each defaulting independently: the
    /// start to `today` minus [`DEFAULT_WINDOW_DAYS`], the end to `today`.
    ///
    /// Malformed dates are recorded in `v`, as is a start after the end when
    /// the client sent both. The returned range is only meaningful when `v`
    /// is valid.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        today: NaiveDate,
        v: &mut Validator,
    ) -> Self {
        let default_start = today
            .checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN);

        let start = parse_bound(start, "start_date", v);
        let end = parse_bound(end, "end_date", v);
        if let (Some(start), Some(end)) = (start, end) {
            v.check(start <= end, "start_date", "must not be after end_date");
        }

        Self {
            start: start.unwrap_or(default_start),
            end: end.unwrap_or(today),
        }
    }
}

/// The supplied date, or `None` when absent or malformed. A malformed date
/// is recorded in `v`.
fn parse_bound(raw: Option<&str>, key: &str, v: &mut Validator) -> Option<NaiveDate> {
    let raw = raw.filter(|s| !s.is_empty())?;
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            v.add_error(key, "must be in format YYYY-MM-DD");
            None
        }
    }
}

/// Totals for one exercise across the logs in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseStats {
    pub exercise_id: i64,
    pub exercise_name: String,
    pub total_sets: i64,
    /// Sum of `sets * reps` over every item.
    pub total_reps: i64,
    pub max_weight: f64,
    /// Number of distinct logs that contain the exercise.
    pub workouts: i64,
}

impl ExerciseStats {
    pub fn new(exercise_id: i64, exercise_name: impl Into<String>) -> Self {
        Self {
            exercise_id,
            exercise_name: exercise_name.into(),
            total_sets: 0,
            total_reps: 0,
            max_weight: 0.0,
            workouts: 0,
        }
    }
}

/// The reduced view of a user's logs over a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub workout_count: usize,
    /// Minutes.
    pub total_duration: i64,
    pub exercise_stats: BTreeMap<i64, ExerciseStats>,
    pub workouts: Vec<WorkoutLog>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn bounds_default_independently() {
        let mut v = Validator::new();
        let range = DateRange::resolve(None, Some("2024-06-01"), today(), &mut v);
        assert!(v.valid());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());

        let range = DateRange::resolve(Some(""), None, today(), &mut v);
        assert!(v.valid());
        assert_eq!(range.end, today());
    }

    #[test]
    fn malformed_dates_are_field_errors() {
        let mut v = Validator::new();
        DateRange::resolve(Some("15/06/2024"), Some("2024-13-01"), today(), &mut v);
        let errors = v.finish().unwrap_err();
        assert_eq!(errors["start_date"], "must be in format YYYY-MM-DD");
        assert_eq!(errors["end_date"], "must be in format YYYY-MM-DD");
    }

    #[test]
    fn start_after_end_is_rejected() {
        let mut v = Validator::new();
        DateRange::resolve(Some("2024-06-10"), Some("2024-06-01"), today(), &mut v);
        assert_eq!(v.errors()["start_date"], "must not be after end_date");
    }

    #[test]
    fn a_lone_bound_is_never_compared_with_a_default() {
        // Only the end is sent, and it falls before today minus the window.
        let mut v = Validator::new();
        let range = DateRange::resolve(None, Some("2024-01-31"), today(), &mut v);
        assert!(v.valid(), "{:?}", v.errors());
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());

        // Only the start is sent, and it lies in the future.
        let range = DateRange::resolve(Some("2024-07-01"), None, today(), &mut v);
        assert!(v.valid(), "{:?}", v.errors());
        assert_eq!(range.end, today());
    }
}
