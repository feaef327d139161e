/// Tools for listing and viewing habits
///
/// This module implements the habit_list and habit_get MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsEngine;
use crate::domain::{Category, Habit, HabitCompletion};
use crate::storage::{HabitStorage, UserStorage};
use crate::tools::{owned_habit, require_user, ToolError};

/// Parameters for listing habits
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListHabitsParams {
    pub user_id: String,
    /// Only habits in this category
    pub category: Option<String>,
    /// Hide archived habits (default: true)
    pub active_only: Option<bool>,
    /// "name", "streak" or "created" (default: created, newest first)
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HabitRefParams {
    pub user_id: String,
    pub habit_id: String,
}

/// One row of the habit list
#[derive(Debug, Serialize)]
pub struct HabitSummary {
    pub habit_id: String,
    pub name: String,
    pub category: String,
    pub frequency: String,
    pub target: Option<String>,
    pub current_streak: u32,
    pub due_today: bool,
    pub completed_today: bool,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
pub struct ListHabitsResponse {
    pub success: bool,
    pub habits: Vec<HabitSummary>,
    pub total: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HabitResponse {
    pub success: bool,
    pub habit: Habit,
    pub current_streak: u32,
    /// The most recent records, newest first
    pub recent_completions: Vec<HabitCompletion>,
    pub message: String,
}

const RECENT_COMPLETIONS: usize = 7;

/// List the acting user's habits, annotated with streak and today's status
pub fn list_habits<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: ListHabitsParams,
) -> Result<ListHabitsResponse, ToolError>
where
    S: UserStorage + HabitStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let category = params
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()?;

    let habits = storage.list_habits(&user.id, category.as_ref(), params.active_only.unwrap_or(true))?;
    let today = analytics.today();

    let mut summaries = Vec::with_capacity(habits.len());
    for habit in habits {
        let completions = storage.get_completions(&habit.id)?;
        summaries.push(HabitSummary {
            habit_id: habit.id.to_string(),
            category: habit.category.display_name().to_string(),
            frequency: habit.frequency.describe(),
            target: habit.target_display(),
            current_streak: analytics.current_streak(&completions),
            due_today: habit.is_due_on(today),
            completed_today: completions.iter().any(|c| c.date == today && c.completed),
            is_active: habit.is_active,
            name: habit.name,
        });
    }

    match params.sort_by.as_deref().map(str::trim) {
        None | Some("") | Some("created") => {}
        Some("name") => summaries.sort_by_key(|h| h.name.to_lowercase()),
        Some("streak") => summaries.sort_by(|a, b| b.current_streak.cmp(&a.current_streak)),
        Some(other) => {
            return Err(ToolError::Validation(format!(
                "Invalid sort_by '{}'. Valid options: name, streak, created",
                other
            )))
        }
    }

    let total = summaries.len();
    let message = if total == 0 {
        "No habits found. Create your first habit to get started!".to_string()
    } else {
        let done = summaries.iter().filter(|h| h.completed_today).count();
        let due = summaries.iter().filter(|h| h.due_today).count();
        format!("{} habits, {} of {} due today completed", total, done, due)
    };

    Ok(ListHabitsResponse {
        success: true,
        habits: summaries,
        total,
        message,
    })
}

/// One habit with its current streak and latest records
pub fn get_habit<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: HabitRefParams,
) -> Result<HabitResponse, ToolError>
where
    S: UserStorage + HabitStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let habit = owned_habit(storage, &user.id, &params.habit_id)?;

    let completions = storage.get_completions(&habit.id)?;
    let current_streak = analytics.current_streak(&completions);
    let recent_completions: Vec<HabitCompletion> =
        completions.into_iter().rev().take(RECENT_COMPLETIONS).collect();

    Ok(HabitResponse {
        success: true,
        message: format!("'{}' is on a {}-day streak", habit.name, current_streak),
        habit,
        current_streak,
        recent_completions,
    })
}
