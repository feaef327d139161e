/// Workout progression, volume and personal-record analytics
///
/// All functions work on already-fetched workouts. Only completed workouts
/// are considered, in chronological order.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use chrono::{Datelike, NaiveDate};
use crate::analytics::habits::{round2, window_start};
use crate::domain::{Exercise, Workout, WorkoutId, WorkoutStatus};

/// Narrows which workouts and exercises feed the analytics
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkoutFilter {
    /// Exercise name, matched case-insensitively
    pub exercise: Option<String>,
    /// Muscle group tag, matched case-insensitively
    pub muscle_group: Option<String>,
    /// Only workouts from the last N days, today included
    pub days: Option<u32>,
}

impl WorkoutFilter {
    fn includes_date(&self, date: NaiveDate, today: NaiveDate) -> bool {
        match self.days {
            Some(days) => date >= window_start(today, days) && date <= today,
            None => true,
        }
    }

    fn includes_exercise(&self, exercise: &Exercise) -> bool {
        let name_ok = self
            .exercise
            .as_ref()
            .map_or(true, |name| exercise_key(name) == exercise_key(&exercise.name));
        let group_ok = self.muscle_group.as_ref().map_or(true, |group| {
            exercise
                .muscle_group
                .as_ref()
                .is_some_and(|g| g.trim().eq_ignore_ascii_case(group.trim()))
        });
        name_ok && group_ok
    }
}

/// One exercise occurrence in the progression series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionPoint {
    pub date: NaiveDate,
    pub workout_id: WorkoutId,
    pub max_weight: f64,
    pub total_volume: f64,
    pub set_count: u32,
    pub max_reps: u32,
    #[serde(rename = "estimated1RM")]
    pub estimated_one_rep_max: f64,
}

impl ProgressionPoint {
    fn from_exercise(workout: &Workout, exercise: &Exercise) -> Self {
        let max_weight = exercise.max_weight();
        let max_reps = exercise.max_reps();
        Self {
            date: workout.date,
            workout_id: workout.id.clone(),
            max_weight,
            total_volume: exercise.volume(),
            set_count: exercise.sets.len() as u32,
            max_reps,
            estimated_one_rep_max: round2(estimated_one_rep_max(max_weight, max_reps)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseProgression {
    pub exercise: String,
    pub points: Vec<ProgressionPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyVolume {
    /// `YYYY-Www`, Sunday-based
    pub week: String,
    pub volume: f64,
    pub workouts: u32,
}

/// Aggregated training analytics over a filtered set of workouts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutAnalytics {
    pub total_workouts: u32,
    pub total_volume: f64,
    pub total_duration_seconds: i64,
    pub progression: Vec<ExerciseProgression>,
    pub muscle_group_volume: BTreeMap<String, f64>,
    pub weekly_volume: Vec<WeeklyVolume>,
}

/// Epley estimate of the one-repetition maximum
///
/// A single rep is already a max, so the weight is returned unchanged.
pub fn estimated_one_rep_max(max_weight: f64, max_reps: u32) -> f64 {
    if max_reps == 1 {
        max_weight
    } else {
        max_weight * (1.0 + max_reps as f64 / 30.0)
    }
}

/// Week bucket for weekly volume: year plus a Sunday-based week-of-year
///
/// Week 1 runs from January 1st to the first Saturday.
pub fn week_key(date: NaiveDate) -> String {
    let jan_first_offset = NaiveDate::from_yo_opt(date.year(), 1)
        .map(|d| d.weekday().num_days_from_sunday())
        .unwrap_or(0);
    let week = (date.ordinal0() + jan_first_offset + 1).div_ceil(7);
    format!("{}-W{:02}", date.year(), week)
}

/// Normalized exercise identity: trimmed and case-folded
pub fn exercise_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Completed workouts sorted oldest first
pub fn completed_chronological(workouts: &[Workout]) -> Vec<&Workout> {
    let mut completed: Vec<&Workout> = workouts
        .iter()
        .filter(|w| w.status == WorkoutStatus::Completed)
        .collect();
    completed.sort_by_key(|w| (w.date, w.started_at.unwrap_or(w.created_at)));
    completed
}

/// Progression, muscle-group volume and weekly volume for the filtered workouts
pub fn analyze_workouts(workouts: &[Workout], filter: &WorkoutFilter, today: NaiveDate) -> WorkoutAnalytics {
    let mut total_workouts = 0;
    let mut total_volume = 0.0;
    let mut total_duration_seconds = 0;
    let mut progression: BTreeMap<String, ExerciseProgression> = BTreeMap::new();
    let mut muscle_group_volume: BTreeMap<String, f64> = BTreeMap::new();
    let mut weekly: BTreeMap<String, WeeklyVolume> = BTreeMap::new();

    for workout in completed_chronological(workouts) {
        if !filter.includes_date(workout.date, today) {
            continue;
        }

        let matched: Vec<&Exercise> = workout
            .exercises
            .iter()
            .filter(|e| filter.includes_exercise(e))
            .collect();
        if matched.is_empty() {
            continue;
        }

        let mut workout_volume = 0.0;
        for exercise in matched {
            let volume = exercise.volume();
            workout_volume += volume;

            progression
                .entry(exercise_key(&exercise.name))
                .or_insert_with(|| ExerciseProgression {
                    exercise: exercise.name.clone(),
                    points: Vec::new(),
                })
                .points
                .push(ProgressionPoint::from_exercise(workout, exercise));

            if let Some(group) = &exercise.muscle_group {
                *muscle_group_volume.entry(group.clone()).or_insert(0.0) += volume;
            }
        }

        let week = week_key(workout.date);
        let bucket = weekly.entry(week.clone()).or_insert_with(|| WeeklyVolume {
            week,
            volume: 0.0,
            workouts: 0,
        });
        bucket.volume += workout_volume;
        bucket.workouts += 1;

        total_workouts += 1;
        total_volume += workout_volume;
        total_duration_seconds += workout.duration_seconds;
    }

    WorkoutAnalytics {
        total_workouts,
        total_volume,
        total_duration_seconds,
        progression: progression.into_values().collect(),
        muscle_group_volume,
        weekly_volume: weekly.into_values().collect(),
    }
}

/// The three dimensions a personal record is tracked on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordDimension {
    Weight,
    Reps,
    Volume,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordValue {
    pub value: f64,
    pub date: NaiveDate,
    pub workout_id: WorkoutId,
}

/// Best-ever values for one exercise
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecord {
    pub exercise: String,
    pub max_weight: RecordValue,
    pub max_reps: RecordValue,
    pub max_volume: RecordValue,
}

/// A workout matching or beating a stored record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordBreak {
    pub exercise: String,
    pub dimension: RecordDimension,
    pub value: f64,
    pub previous: f64,
    pub date: NaiveDate,
    pub workout_id: WorkoutId,
}

/// Running personal records per exercise
///
/// The first occurrence of an exercise sets its baseline. Every later
/// occurrence that equals or exceeds a stored value on a dimension breaks
/// that record; dimensions are judged independently.
#[derive(Debug, Clone, Default)]
pub struct RecordBook {
    records: BTreeMap<String, PersonalRecord>,
    breaks: Vec<RecordBreak>,
}

impl RecordBook {
    /// Replay every completed workout in chronological order
    pub fn from_workouts(workouts: &[Workout]) -> Self {
        let mut book = Self::default();
        for workout in completed_chronological(workouts) {
            book.observe(workout);
        }
        book
    }

    /// Records the given workout breaks against the prior history
    ///
    /// History is the user's other completed workouts dated on or before
    /// `workout`.
    pub fn breaks_for(history: &[Workout], workout: &Workout) -> Vec<RecordBreak> {
        let prior: Vec<Workout> = history
            .iter()
            .filter(|w| w.id != workout.id && w.date <= workout.date)
            .cloned()
            .collect();
        let mut book = Self::from_workouts(&prior);
        book.observe(workout)
    }

    /// Fold one workout into the book, returning the records it broke
    pub fn observe(&mut self, workout: &Workout) -> Vec<RecordBreak> {
        let mut broken = Vec::new();

        for exercise in workout.exercises.iter().filter(|e| !e.sets.is_empty()) {
            let candidates = [
                (RecordDimension::Weight, exercise.max_weight()),
                (RecordDimension::Reps, exercise.max_reps() as f64),
                (RecordDimension::Volume, exercise.volume()),
            ];
            let stamp = |value: f64| RecordValue {
                value,
                date: workout.date,
                workout_id: workout.id.clone(),
            };

            let record = match self.records.entry(exercise_key(&exercise.name)) {
                Entry::Vacant(slot) => {
                    slot.insert(PersonalRecord {
                        exercise: exercise.name.clone(),
                        max_weight: stamp(candidates[0].1),
                        max_reps: stamp(candidates[1].1),
                        max_volume: stamp(candidates[2].1),
                    });
                    continue;
                }
                Entry::Occupied(slot) => slot.into_mut(),
            };

            for (dimension, value) in candidates {
                let stored = match dimension {
                    RecordDimension::Weight => &mut record.max_weight,
                    RecordDimension::Reps => &mut record.max_reps,
                    RecordDimension::Volume => &mut record.max_volume,
                };
                if value >= stored.value {
                    broken.push(RecordBreak {
                        exercise: record.exercise.clone(),
                        dimension,
                        value,
                        previous: stored.value,
                        date: workout.date,
                        workout_id: workout.id.clone(),
                    });
                    *stored = stamp(value);
                }
            }
        }

        self.breaks.extend(broken.iter().cloned());
        broken
    }

    pub fn get(&self, exercise: &str) -> Option<&PersonalRecord> {
        self.records.get(&exercise_key(exercise))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every break observed so far, oldest first
    pub fn breaks(&self) -> &[RecordBreak] {
        &self.breaks
    }

    pub fn into_records(self) -> Vec<PersonalRecord> {
        self.records.into_values().collect()
    }
}
