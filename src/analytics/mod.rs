/// Analytics engine for habit and workout statistics
///
/// The computations live in `habits` and `workouts` as pure functions that
/// take "today" explicitly. `AnalyticsEngine` supplies the current date and
/// the configured default window.

pub mod habits;
pub mod workouts;

pub use habits::{HabitAnalytics, HeatmapDay, DEFAULT_WINDOW_DAYS, HEATMAP_DAYS, MAX_WINDOW_DAYS};
pub use workouts::{
    estimated_one_rep_max, exercise_key, week_key, ExerciseProgression, PersonalRecord, ProgressionPoint,
    RecordBook, RecordBreak, RecordDimension, RecordValue, WeeklyVolume, WorkoutAnalytics,
    WorkoutFilter,
};

use serde::Serialize;
use chrono::{NaiveDate, Utc};
use crate::domain::{Habit, HabitCompletion, Workout, WorkoutStatus};

/// Personal records plus the history of when they were set
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordsReport {
    pub records: Vec<PersonalRecord>,
    /// Every record break across the user's history, newest first
    pub recent_breaks: Vec<RecordBreak>,
}

/// Account-wide totals for a user's profile page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_habits: u32,
    pub active_habits: u32,
    pub total_completions: u32,
    pub best_current_streak: u32,
    pub longest_streak: u32,
    pub completed_workouts: u32,
    pub total_volume: f64,
    pub total_duration_seconds: i64,
    pub workouts_last_7_days: u32,
}

/// Analytics engine for processing habit and workout data
pub struct AnalyticsEngine {
    default_window_days: u32,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl AnalyticsEngine {
    /// Create a new analytics engine with a default lookback window
    pub fn new(default_window_days: u32) -> Self {
        Self {
            default_window_days: default_window_days.clamp(1, MAX_WINDOW_DAYS),
        }
    }

    pub fn default_window_days(&self) -> u32 {
        self.default_window_days
    }

    /// The day analytics treat as "today" (UTC)
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Streaks, completion rate, weekday histogram and heatmap for one habit
    pub fn habit_analytics(
        &self,
        habit: &Habit,
        completions: &[HabitCompletion],
        window_days: Option<u32>,
    ) -> HabitAnalytics {
        let window = window_days.unwrap_or(self.default_window_days);
        habits::analyze_habit(habit, completions, window, self.today())
    }

    /// Current streak only, for habit lists
    pub fn current_streak(&self, completions: &[HabitCompletion]) -> u32 {
        habits::current_streak(&habits::completed_dates_desc(completions), self.today())
    }

    /// Progression and volume analytics over a user's completed workouts
    pub fn workout_analytics(&self, history: &[Workout], filter: &WorkoutFilter) -> WorkoutAnalytics {
        workouts::analyze_workouts(history, filter, self.today())
    }

    /// Personal records across all of a user's completed workouts
    ///
    /// `exercise` narrows the report to one exercise without changing how
    /// the records themselves are computed.
    pub fn personal_records(&self, history: &[Workout], exercise: Option<&str>, limit: usize) -> RecordsReport {
        let book = RecordBook::from_workouts(history);
        let wanted = |name: &str| exercise.map_or(true, |e| workouts::exercise_key(e) == workouts::exercise_key(name));

        let recent_breaks: Vec<RecordBreak> = book
            .breaks()
            .iter()
            .rev()
            .filter(|b| wanted(&b.exercise))
            .take(limit)
            .cloned()
            .collect();
        let records = book
            .into_records()
            .into_iter()
            .filter(|r| wanted(&r.exercise))
            .collect();

        RecordsReport { records, recent_breaks }
    }

    /// Records a just-finished workout broke against the user's history
    pub fn records_broken_by(&self, history: &[Workout], workout: &Workout) -> Vec<RecordBreak> {
        if workout.status != WorkoutStatus::Completed {
            return Vec::new();
        }
        RecordBook::breaks_for(history, workout)
    }

    /// Totals across a user's habits (with their completions) and workouts
    pub fn user_stats(&self, habit_history: &[(Habit, Vec<HabitCompletion>)], workout_history: &[Workout]) -> UserStats {
        let today = self.today();
        let mut stats = UserStats {
            total_habits: habit_history.len() as u32,
            active_habits: habit_history.iter().filter(|(h, _)| h.is_active).count() as u32,
            total_completions: 0,
            best_current_streak: 0,
            longest_streak: 0,
            completed_workouts: 0,
            total_volume: 0.0,
            total_duration_seconds: 0,
            workouts_last_7_days: 0,
        };

        for (_, completions) in habit_history {
            let dates = habits::completed_dates_desc(completions);
            stats.total_completions += dates.len() as u32;
            stats.best_current_streak = stats.best_current_streak.max(habits::current_streak(&dates, today));
            stats.longest_streak = stats.longest_streak.max(habits::longest_streak(&dates));
        }

        let week_start = today - chrono::Duration::days(6);
        for workout in workouts::completed_chronological(workout_history) {
            stats.completed_workouts += 1;
            stats.total_volume += workout.total_volume();
            stats.total_duration_seconds += workout.duration_seconds;
            if workout.date >= week_start && workout.date <= today {
                stats.workouts_last_7_days += 1;
            }
        }

        stats
    }
}
