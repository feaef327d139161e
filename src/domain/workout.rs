/// Workout, Exercise and ExerciseSet entities
///
/// A workout is either logged after the fact, planned for later, or run live
/// through the start / pause / resume / end lifecycle.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::domain::{DomainError, UserId, WorkoutId, WorkoutStatus};

/// One set of an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub reps: u32,
    /// Load in the user's weight unit; 0 for bodyweight
    pub weight: f64,
    /// Rest taken after the set
    pub rest_seconds: Option<u32>,
    /// Rate of perceived exertion, 1-10
    pub rpe: Option<u8>,
}

impl ExerciseSet {
    pub fn new(reps: u32, weight: f64, rest_seconds: Option<u32>, rpe: Option<u8>) -> Result<Self, DomainError> {
        let set = Self { reps, weight, rest_seconds, rpe };
        set.validate()?;
        Ok(set)
    }

    /// reps × weight
    pub fn volume(&self) -> f64 {
        self.reps as f64 * self.weight
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(DomainError::InvalidValue {
                message: "Set weight must be a non-negative number".to_string(),
            });
        }
        if self.weight > 10_000.0 {
            return Err(DomainError::InvalidValue {
                message: "Set weight cannot exceed 10000".to_string(),
            });
        }
        if self.reps > 1000 {
            return Err(DomainError::InvalidValue {
                message: "Set reps cannot exceed 1000".to_string(),
            });
        }
        if let Some(rpe) = self.rpe {
            if !(1..=10).contains(&rpe) {
                return Err(DomainError::InvalidValue {
                    message: "RPE must be between 1 and 10".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// An exercise performed within a workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub sets: Vec<ExerciseSet>,
    pub notes: Option<String>,
}

impl Exercise {
    pub fn new(
        name: String,
        muscle_group: Option<String>,
        equipment: Option<String>,
        sets: Vec<ExerciseSet>,
    ) -> Result<Self, DomainError> {
        let exercise = Self {
            name: name.trim().to_string(),
            muscle_group: normalize_tag(muscle_group),
            equipment: normalize_tag(equipment),
            sets,
            notes: None,
        };
        exercise.validate()?;
        Ok(exercise)
    }

    /// Σ reps × weight over all sets
    pub fn volume(&self) -> f64 {
        self.sets.iter().map(ExerciseSet::volume).sum()
    }

    pub fn max_weight(&self) -> f64 {
        self.sets.iter().map(|s| s.weight).fold(0.0, f64::max)
    }

    pub fn max_reps(&self) -> u32 {
        self.sets.iter().map(|s| s.reps).max().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidExercise("Exercise name cannot be empty".to_string()));
        }
        if self.name.len() > 100 {
            return Err(DomainError::InvalidExercise(
                "Exercise name cannot be longer than 100 characters".to_string(),
            ));
        }
        for set in &self.sets {
            set.validate()?;
        }
        Ok(())
    }

    fn set_mut(&mut self, set_index: usize) -> Result<&mut ExerciseSet, DomainError> {
        let count = self.sets.len();
        self.sets.get_mut(set_index).ok_or_else(|| {
            DomainError::InvalidExercise(format!(
                "Set {} does not exist ({} sets recorded)",
                set_index, count
            ))
        })
    }
}

fn normalize_tag(tag: Option<String>) -> Option<String> {
    tag.map(|t| t.trim().to_lowercase()).filter(|t| !t.is_empty())
}

/// A training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub user_id: UserId,
    pub name: String,
    /// Training day the workout counts toward
    pub date: NaiveDate,
    pub status: WorkoutStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Beginning of the current active segment; only set while active
    pub active_since: Option<DateTime<Utc>>,
    /// Active time accumulated by finished segments
    pub duration_seconds: i64,
    pub exercises: Vec<Exercise>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Workout {
    /// Record a workout with its exercises, either planned or already done
    ///
    /// Logged workouts need at least one exercise.
    pub fn new(
        user_id: UserId,
        name: String,
        date: NaiveDate,
        exercises: Vec<Exercise>,
        completed: bool,
        duration_seconds: Option<i64>,
    ) -> Result<Self, DomainError> {
        if exercises.is_empty() {
            return Err(DomainError::Validation {
                message: "A workout needs at least one exercise".to_string(),
            });
        }
        if duration_seconds.is_some_and(|d| d < 0) {
            return Err(DomainError::InvalidValue {
                message: "Duration cannot be negative".to_string(),
            });
        }

        let mut workout = Self::blank(user_id, name, date)?;
        for exercise in &exercises {
            exercise.validate()?;
        }
        workout.exercises = exercises;
        workout.duration_seconds = duration_seconds.unwrap_or(0);
        if completed {
            workout.status = WorkoutStatus::Completed;
        }
        Ok(workout)
    }

    /// Begin a live workout right now
    pub fn begin(user_id: UserId, name: Option<String>, now: DateTime<Utc>) -> Result<Self, DomainError> {
        let name = name.unwrap_or_else(|| format!("Workout {}", now.format("%Y-%m-%d")));
        let mut workout = Self::blank(user_id, name, now.date_naive())?;
        workout.start(now)?;
        Ok(workout)
    }

    fn blank(user_id: UserId, name: String, date: NaiveDate) -> Result<Self, DomainError> {
        let name = name.trim().to_string();
        if name.is_empty() || name.len() > 100 {
            return Err(DomainError::Validation {
                message: "Workout name must be 1-100 characters".to_string(),
            });
        }

        Ok(Self {
            id: WorkoutId::new(),
            user_id,
            name,
            date,
            status: WorkoutStatus::Planned,
            started_at: None,
            ended_at: None,
            active_since: None,
            duration_seconds: 0,
            exercises: Vec::new(),
            notes: None,
            created_at: Utc::now(),
        })
    }

    /// planned → active
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != WorkoutStatus::Planned {
            return Err(DomainError::InvalidTransition { action: "start", status: self.status });
        }
        self.status = WorkoutStatus::Active;
        self.started_at = Some(now);
        self.active_since = Some(now);
        self.date = now.date_naive();
        Ok(())
    }

    /// active → paused
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != WorkoutStatus::Active {
            return Err(DomainError::InvalidTransition { action: "pause", status: self.status });
        }
        self.close_segment(now);
        self.status = WorkoutStatus::Paused;
        Ok(())
    }

    /// paused → active
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != WorkoutStatus::Paused {
            return Err(DomainError::InvalidTransition { action: "resume", status: self.status });
        }
        self.status = WorkoutStatus::Active;
        self.active_since = Some(now);
        Ok(())
    }

    /// active | paused → completed
    pub fn finish(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !self.status.is_in_progress() {
            return Err(DomainError::InvalidTransition { action: "end", status: self.status });
        }
        self.close_segment(now);
        self.status = WorkoutStatus::Completed;
        self.ended_at = Some(now);
        Ok(())
    }

    fn close_segment(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.active_since.take() {
            self.duration_seconds += (now - since).num_seconds().max(0);
        }
    }

    /// Active time so far, including a running segment
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        let running = self
            .active_since
            .map(|since| (now - since).num_seconds().max(0))
            .unwrap_or(0);
        self.duration_seconds + running
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(Exercise::volume).sum()
    }

    pub fn total_sets(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }

    pub fn add_exercise(&mut self, exercise: Exercise) -> Result<usize, DomainError> {
        exercise.validate()?;
        self.exercises.push(exercise);
        Ok(self.exercises.len() - 1)
    }

    /// Only in-progress workouts may be left without exercises
    pub fn remove_exercise(&mut self, exercise_index: usize) -> Result<Exercise, DomainError> {
        self.exercise_mut(exercise_index)?;
        if self.exercises.len() == 1 && !self.status.is_in_progress() {
            return Err(DomainError::Validation {
                message: "A workout needs at least one exercise".to_string(),
            });
        }
        Ok(self.exercises.remove(exercise_index))
    }

    pub fn add_set(&mut self, exercise_index: usize, set: ExerciseSet) -> Result<usize, DomainError> {
        set.validate()?;
        let exercise = self.exercise_mut(exercise_index)?;
        exercise.sets.push(set);
        Ok(exercise.sets.len() - 1)
    }

    pub fn update_set(&mut self, exercise_index: usize, set_index: usize, set: ExerciseSet) -> Result<(), DomainError> {
        set.validate()?;
        *self.exercise_mut(exercise_index)?.set_mut(set_index)? = set;
        Ok(())
    }

    pub fn remove_set(&mut self, exercise_index: usize, set_index: usize) -> Result<ExerciseSet, DomainError> {
        let exercise = self.exercise_mut(exercise_index)?;
        exercise.set_mut(set_index)?;
        Ok(exercise.sets.remove(set_index))
    }

    /// Replace the exercise list wholesale (used by workout updates)
    pub fn replace_exercises(&mut self, exercises: Vec<Exercise>) -> Result<(), DomainError> {
        if exercises.is_empty() && !self.status.is_in_progress() {
            return Err(DomainError::Validation {
                message: "A workout needs at least one exercise".to_string(),
            });
        }
        for exercise in &exercises {
            exercise.validate()?;
        }
        self.exercises = exercises;
        Ok(())
    }

    pub fn rename(&mut self, name: String) -> Result<(), DomainError> {
        let name = name.trim().to_string();
        if name.is_empty() || name.len() > 100 {
            return Err(DomainError::Validation {
                message: "Workout name must be 1-100 characters".to_string(),
            });
        }
        self.name = name;
        Ok(())
    }

    fn exercise_mut(&mut self, exercise_index: usize) -> Result<&mut Exercise, DomainError> {
        let count = self.exercises.len();
        self.exercises.get_mut(exercise_index).ok_or_else(|| {
            DomainError::InvalidExercise(format!(
                "Exercise {} does not exist ({} exercises recorded)",
                exercise_index, count
            ))
        })
    }
}
