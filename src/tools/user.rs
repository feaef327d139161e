/// Tools for registering and managing users
///
/// Implements user_register, user_get, user_update and user_stats.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsEngine, UserStats};
use crate::domain::{Habit, HabitCompletion, User, UserUpdate, WorkoutStatus};
use crate::storage::{HabitStorage, UserStorage, WorkoutStorage};
use crate::tools::{require_user, ToolError};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RegisterUserParams {
    /// 3-30 characters: letters, digits, underscore
    pub username: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// "kg" (default) or "lb"
    pub weight_unit: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UserRefParams {
    pub user_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateUserParams {
    pub user_id: String,
    pub display_name: Option<String>,
    /// Empty string removes the email
    pub email: Option<String>,
    pub weight_unit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub success: bool,
    pub user: User,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserStatsResponse {
    pub success: bool,
    pub user_id: String,
    pub stats: UserStats,
    pub message: String,
}

pub fn register_user<S: UserStorage>(storage: &S, params: RegisterUserParams) -> Result<UserResponse, ToolError> {
    let user = User::new(params.username, params.display_name, params.email, params.weight_unit)?;
    storage.create_user(&user)?;

    tracing::info!("Registered user {} ({})", user.username, user.id);
    Ok(UserResponse {
        success: true,
        message: format!("Welcome, {}! Your user ID is {}", user.display_name, user.id),
        user,
    })
}

pub fn get_user<S: UserStorage>(storage: &S, params: UserRefParams) -> Result<UserResponse, ToolError> {
    let user = require_user(storage, &params.user_id)?;
    Ok(UserResponse {
        success: true,
        message: format!("{} (@{})", user.display_name, user.username),
        user,
    })
}

pub fn update_user<S: UserStorage>(storage: &S, params: UpdateUserParams) -> Result<UserResponse, ToolError> {
    let mut user = require_user(storage, &params.user_id)?;

    user.update(UserUpdate {
        display_name: params.display_name,
        email: params.email,
        weight_unit: params.weight_unit,
    })?;
    storage.update_user(&user)?;

    Ok(UserResponse {
        success: true,
        message: "Profile updated".to_string(),
        user,
    })
}

/// Account-wide totals across every habit and completed workout
pub fn user_stats<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: UserRefParams,
) -> Result<UserStatsResponse, ToolError>
where
    S: UserStorage + HabitStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;

    let habit_history = storage
        .list_habits(&user.id, None, false)?
        .into_iter()
        .map(|habit| -> Result<(Habit, Vec<HabitCompletion>), ToolError> {
            let completions = storage.get_completions(&habit.id)?;
            Ok((habit, completions))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let workouts = storage.list_workouts(&user.id, Some(WorkoutStatus::Completed), None)?;

    let stats = analytics.user_stats(&habit_history, &workouts);
    let message = format!(
        "{} active habits, {} completed workouts, best current streak {} days",
        stats.active_habits, stats.completed_workouts, stats.best_current_streak
    );

    Ok(UserStatsResponse {
        success: true,
        user_id: user.id.to_string(),
        stats,
        message,
    })
}
