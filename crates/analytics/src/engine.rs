use std::collections::{BTreeMap, BTreeSet};

use core_types::WorkoutLog;

use crate::report::{DateRange, ExerciseStats, ProgressReport};

/// A stateless calculator that reduces workout logs into a progress report.
#[derive(Debug, Default)]
pub struct ReportEngine {}

impl ReportEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduces `logs` (already bounded to `range` by the caller) into a report.
    ///
    /// Session count and total duration always cover every log. When
    /// `exercise_id` is given, items of other exercises are left out of the
    /// per-exercise statistics.
    pub fn summarize(
        &self,
        range: DateRange,
        exercise_id: Option<i64>,
        logs: Vec<WorkoutLog>,
    ) -> ProgressReport {
        let total_duration = logs.iter().map(|log| i64::from(log.duration)).sum();
        let exercise_stats = self.exercise_stats(&logs, exercise_id);

        tracing::debug!(
            logs = logs.len(),
            exercises = exercise_stats.len(),
            "progress report reduced"
        );

        ProgressReport {
            start_date: range.start,
            end_date: range.end,
            workout_count: logs.len(),
            total_duration,
            exercise_stats,
            workouts: logs,
        }
    }

    fn exercise_stats(
        &self,
        logs: &[WorkoutLog],
        exercise_id: Option<i64>,
    ) -> BTreeMap<i64, ExerciseStats> {
        let mut stats: BTreeMap<i64, ExerciseStats> = BTreeMap::new();

        for log in logs {
            let mut seen_in_log = BTreeSet::new();

            for item in &log.items {
                if exercise_id.is_some_and(|id| id != item.exercise_id) {
                    continue;
                }

                let entry = stats.entry(item.exercise_id).or_insert_with(|| {
                    let name = item.exercise.as_ref().map_or("", |e| e.name.as_str());
                    ExerciseStats::new(item.exercise_id, name)
                });
                entry.total_sets += i64::from(item.sets);
                entry.total_reps += i64::from(item.sets) * i64::from(item.reps);
                if item.weight > entry.max_weight {
                    entry.max_weight = item.weight;
                }
                if seen_in_log.insert(item.exercise_id) {
                    entry.workouts += 1;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use core_types::{ExerciseSummary, WorkoutLogItem};

    use super::*;

    fn exercise(id: i64, name: &str) -> ExerciseSummary {
        ExerciseSummary {
            id,
            name: name.to_string(),
            description: String::new(),
            category: "strength".to_string(),
            muscle_group: "chest".to_string(),
        }
    }

    fn log(id: i64, duration: i32, items: &[(i64, i32, i32, f64)]) -> WorkoutLog {
        WorkoutLog {
            id,
            workout_id: 1,
            user_id: 1,
            date: NaiveDate::from_ymd_opt(2024, 5, id as u32).unwrap(),
            duration,
            notes: String::new(),
            workout_name: "Push".to_string(),
            items: items
                .iter()
                .enumerate()
                .map(|(i, &(exercise_id, sets, reps, weight))| WorkoutLogItem {
                    id: id * 10 + i as i64,
                    log_id: id,
                    exercise_id,
                    sets,
                    reps,
                    weight,
                    exercise: Some(exercise(exercise_id, &format!("Exercise {exercise_id}"))),
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    fn range() -> DateRange {
        DateRange {
            start: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
        }
    }

    #[test]
    fn two_sessions_of_one_exercise() {
        let logs = vec![log(1, 30, &[(1, 3, 10, 50.0)]), log(2, 45, &[(1, 4, 8, 55.0)])];
        let report = ReportEngine::new().summarize(range(), None, logs);

        assert_eq!(report.workout_count, 2);
        assert_eq!(report.total_duration, 75);
        let stats = &report.exercise_stats[&1];
        assert_eq!(stats.total_sets, 7);
        assert_eq!(stats.total_reps, 62);
        assert_eq!(stats.max_weight, 55.0);
        assert_eq!(stats.workouts, 2);
        assert_eq!(stats.exercise_name, "Exercise 1");
    }

    #[test]
    fn exercise_filter_narrows_stats_but_not_totals() {
        let logs = vec![
            log(1, 30, &[(1, 3, 10, 50.0), (2, 5, 5, 100.0)]),
            log(2, 20, &[(1, 2, 12, 40.0)]),
        ];
        let report = ReportEngine::new().summarize(range(), Some(1), logs);

        assert_eq!(report.workout_count, 2);
        assert_eq!(report.total_duration, 50);
        assert_eq!(report.exercise_stats.keys().copied().collect::<Vec<_>>(), [1]);
        assert_eq!(report.exercise_stats[&1].total_reps, 54);
    }

    #[test]
    fn repeated_exercise_in_one_log_counts_one_workout() {
        let logs = vec![log(1, 60, &[(3, 3, 5, 80.0), (3, 2, 3, 90.0)])];
        let report = ReportEngine::new().summarize(range(), None, logs);

        let stats = &report.exercise_stats[&3];
        assert_eq!(stats.workouts, 1);
        assert_eq!(stats.total_sets, 5);
        assert_eq!(stats.total_reps, 21);
        assert_eq!(stats.max_weight, 90.0);
    }

    #[test]
    fn empty_range_yields_zeroes() {
        let report = ReportEngine::new().summarize(range(), None, Vec::new());
        assert_eq!(report.workout_count, 0);
        assert_eq!(report.total_duration, 0);
        assert!(report.exercise_stats.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["start_date"], "2024-05-01");
        assert_eq!(json["end_date"], "2024-05-31");
    }
}
