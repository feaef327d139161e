/// Storage layer for persisting users, habits and workouts
///
/// This module handles all database operations using SQLite. The traits
/// describe what the tools need; `SqliteStorage` implements all of them.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use thiserror::Error;
use chrono::NaiveDate;
use crate::domain::{
    Category, Habit, HabitCompletion, HabitId, User, UserId, Workout, WorkoutId, WorkoutStatus,
};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Workout not found: {workout_id}")]
    WorkoutNotFound { workout_id: String },

    #[error("Username '{username}' is already taken")]
    DuplicateUsername { username: String },

    #[error("User already has an in-progress workout: {workout_id}")]
    ActiveWorkoutExists { workout_id: String },

    #[error("Migration error: {0}")]
    Migration(String),
}

/// An exercise name seen in a user's workouts, with its latest tags
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LibraryExercise {
    pub name: String,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    pub usage_count: u32,
}

/// Persistence for user profiles
pub trait UserStorage {
    /// Create a new user; usernames are unique (case-insensitive)
    fn create_user(&self, user: &User) -> Result<(), StorageError>;

    fn get_user(&self, user_id: &UserId) -> Result<User, StorageError>;

    fn update_user(&self, user: &User) -> Result<(), StorageError>;
}

/// Persistence for habits and their daily completion records
pub trait HabitStorage {
    /// Create a new habit
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Get a habit by ID
    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError>;

    /// Update an existing habit
    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Delete a habit together with its completion records
    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// List a user's habits with optional filtering, newest first
    fn list_habits(
        &self,
        user_id: &UserId,
        category: Option<&Category>,
        active_only: bool,
    ) -> Result<Vec<Habit>, StorageError>;

    /// Insert the record, or overwrite the existing one for the same habit and day
    ///
    /// Returns the stored record, which keeps the original ID on overwrite.
    fn upsert_completion(&self, completion: &HabitCompletion) -> Result<HabitCompletion, StorageError>;

    /// The record for one habit and day, if any
    fn get_completion(&self, habit_id: &HabitId, date: NaiveDate) -> Result<Option<HabitCompletion>, StorageError>;

    /// All records for a habit, oldest first
    fn get_completions(&self, habit_id: &HabitId) -> Result<Vec<HabitCompletion>, StorageError>;
}

/// Persistence for workouts and the exercise library
pub trait WorkoutStorage {
    /// Store a workout that is not in progress
    fn create_workout(&self, workout: &Workout) -> Result<(), StorageError>;

    /// Insert or update an in-progress workout
    ///
    /// Fails with `ActiveWorkoutExists` if the user already has a different
    /// workout active or paused. The check and the write share a transaction.
    fn save_in_progress_workout(&self, workout: &Workout) -> Result<(), StorageError>;

    fn get_workout(&self, workout_id: &WorkoutId) -> Result<Workout, StorageError>;

    fn update_workout(&self, workout: &Workout) -> Result<(), StorageError>;

    fn delete_workout(&self, workout_id: &WorkoutId) -> Result<(), StorageError>;

    /// A user's workouts, newest first
    fn list_workouts(
        &self,
        user_id: &UserId,
        status: Option<WorkoutStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<Workout>, StorageError>;

    /// The user's active or paused workout, if any
    fn find_in_progress_workout(&self, user_id: &UserId) -> Result<Option<Workout>, StorageError>;

    /// Bump the usage count of each distinct exercise in the workout
    fn record_exercise_usage(&self, workout: &Workout) -> Result<(), StorageError>;

    /// A user's library entries whose name contains `query`, most used first
    fn search_exercise_library(
        &self,
        user_id: &UserId,
        query: Option<&str>,
        muscle_group: Option<&str>,
        limit: u32,
    ) -> Result<Vec<LibraryExercise>, StorageError>;
}
