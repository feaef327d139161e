/// MCP tools for users, habits and workouts
///
/// Each tool takes a deserialized parameter struct (which also provides the
/// tool's input schema) and returns a serializable response. Every call names
/// the acting user; records owned by someone else are reported as not found.

pub mod create;
pub mod exercise;
pub mod list;
pub mod log;
pub mod progress;
pub mod status;
pub mod update;
pub mod user;
pub mod workout;

pub use create::*;
pub use exercise::*;
pub use list::*;
pub use log::*;
pub use progress::*;
pub use status::*;
pub use update::*;
pub use user::*;
pub use workout::*;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::Environment;
use crate::domain::{DomainError, Habit, HabitId, User, UserId, Workout, WorkoutId};
use crate::storage::{HabitStorage, StorageError, UserStorage, WorkoutStorage};

/// Errors returned by tool calls
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Storage(StorageError),
}

/// How a tool error is reported to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Internal,
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::Validation(_) => ErrorKind::Validation,
            ToolError::NotFound { .. } => ErrorKind::NotFound,
            ToolError::Internal(_) | ToolError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// The message shown to the client; internal details stay in the logs in production
    pub fn public_message(&self, environment: Environment) -> String {
        match self.kind() {
            ErrorKind::Internal if environment.is_production() => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<DomainError> for ToolError {
    fn from(err: DomainError) -> Self {
        ToolError::Validation(err.to_string())
    }
}

impl From<StorageError> for ToolError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UserNotFound { user_id } => ToolError::NotFound { entity: "User", id: user_id },
            StorageError::HabitNotFound { habit_id } => ToolError::NotFound { entity: "Habit", id: habit_id },
            StorageError::WorkoutNotFound { workout_id } => ToolError::NotFound { entity: "Workout", id: workout_id },
            StorageError::DuplicateUsername { .. } => ToolError::Validation(err.to_string()),
            StorageError::ActiveWorkoutExists { workout_id } => ToolError::Validation(format!(
                "You already have a workout in progress ({}). End it before starting another.",
                workout_id
            )),
            other => ToolError::Storage(other),
        }
    }
}

/// Response for tools that only report what happened
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: String) -> Self {
        Self { success: true, message }
    }
}

pub(crate) fn parse_user_id(raw: &str) -> Result<UserId, ToolError> {
    if raw.trim().is_empty() {
        return Err(ToolError::Validation("User ID cannot be empty".to_string()));
    }
    UserId::from_string(raw).map_err(|_| ToolError::Validation("Invalid user ID format".to_string()))
}

pub(crate) fn parse_habit_id(raw: &str) -> Result<HabitId, ToolError> {
    if raw.trim().is_empty() {
        return Err(ToolError::Validation("Habit ID cannot be empty".to_string()));
    }
    HabitId::from_string(raw).map_err(|_| ToolError::Validation("Invalid habit ID format".to_string()))
}

pub(crate) fn parse_workout_id(raw: &str) -> Result<WorkoutId, ToolError> {
    if raw.trim().is_empty() {
        return Err(ToolError::Validation("Workout ID cannot be empty".to_string()));
    }
    WorkoutId::from_string(raw).map_err(|_| ToolError::Validation("Invalid workout ID format".to_string()))
}

/// Parse `YYYY-MM-DD`, defaulting to today (UTC)
pub(crate) fn parse_date_or_today(raw: Option<&str>) -> Result<NaiveDate, ToolError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ToolError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", s))),
        None => Ok(Utc::now().date_naive()),
    }
}

/// Look up the acting user
pub(crate) fn require_user<S: UserStorage>(storage: &S, raw_user_id: &str) -> Result<User, ToolError> {
    let user_id = parse_user_id(raw_user_id)?;
    Ok(storage.get_user(&user_id)?)
}

/// Load a habit, hiding other users' habits behind not-found
pub(crate) fn owned_habit<S: HabitStorage>(
    storage: &S,
    user_id: &UserId,
    raw_habit_id: &str,
) -> Result<Habit, ToolError> {
    let habit_id = parse_habit_id(raw_habit_id)?;
    let habit = storage.get_habit(&habit_id)?;
    if habit.user_id != *user_id {
        tracing::debug!("User {} requested habit {} owned by another user", user_id, habit_id);
        return Err(ToolError::NotFound { entity: "Habit", id: habit_id.to_string() });
    }
    Ok(habit)
}

/// Load a workout, hiding other users' workouts behind not-found
pub(crate) fn owned_workout<S: WorkoutStorage>(
    storage: &S,
    user_id: &UserId,
    raw_workout_id: &str,
) -> Result<Workout, ToolError> {
    let workout_id = parse_workout_id(raw_workout_id)?;
    let workout = storage.get_workout(&workout_id)?;
    if workout.user_id != *user_id {
        tracing::debug!("User {} requested workout {} owned by another user", user_id, workout_id);
        return Err(ToolError::NotFound { entity: "Workout", id: workout_id.to_string() });
    }
    Ok(workout)
}
