/// Domain module containing core business logic and data types
///
/// This module defines the core entities (User, Habit, HabitCompletion,
/// Workout) and their validation rules. Workouts also carry their own
/// start/pause/resume/end state machine.

pub mod completion;
pub mod habit;
pub mod types;
pub mod user;
pub mod workout;

// Re-export public types for easy access
pub use completion::*;
pub use habit::*;
pub use types::*;
pub use user::*;
pub use workout::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    #[error("Invalid exercise: {0}")]
    InvalidExercise(String),

    #[error("Cannot {action} a workout that is {status}")]
    InvalidTransition { action: &'static str, status: WorkoutStatus },
}
