/// Tools for recording habit completions
///
/// This module implements the habit_complete and habit_uncomplete MCP tools.
/// Each habit has at most one record per day, so completing the same day
/// again updates that record instead of adding another.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::AnalyticsEngine;
use crate::domain::HabitCompletion;
use crate::storage::{HabitStorage, UserStorage};
use crate::tools::{owned_habit, parse_date_or_today, require_user, ToolError};

/// Parameters for completing a habit on a day
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CompleteHabitParams {
    pub user_id: String,
    pub habit_id: String,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// Amount achieved, for habits with a numeric target
    pub value: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UncompleteHabitParams {
    pub user_id: String,
    pub habit_id: String,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompleteHabitResponse {
    pub success: bool,
    pub completion: HabitCompletion,
    pub current_streak: u32,
    /// Whether a record for this day already existed
    pub updated_existing: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UncompleteHabitResponse {
    pub success: bool,
    /// The day's record after the change, if there is one
    pub completion: Option<HabitCompletion>,
    pub current_streak: u32,
    pub message: String,
}

/// Mark a habit done for a day (find-or-create)
pub fn complete_habit<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: CompleteHabitParams,
) -> Result<CompleteHabitResponse, ToolError>
where
    S: UserStorage + HabitStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let habit = owned_habit(storage, &user.id, &params.habit_id)?;
    let date = parse_date_or_today(params.date.as_deref())?;

    // Validates the date range, value and notes even when a record exists
    let fresh = HabitCompletion::new(habit.id.clone(), date, params.value, params.notes)?;

    let existing = storage.get_completion(&habit.id, date)?;
    let updated_existing = existing.is_some();
    let record = match existing {
        Some(mut record) => {
            record.mark_completed(fresh.value, fresh.notes)?;
            record
        }
        None => fresh,
    };

    let completion = storage.upsert_completion(&record)?;
    let current_streak = analytics.current_streak(&storage.get_completions(&habit.id)?);

    tracing::debug!("Completed habit {} on {} (existing: {})", habit.id, date, updated_existing);

    let message = if current_streak > 1 {
        format!("Completed '{}' for {}. {}-day streak!", habit.name, date, current_streak)
    } else {
        format!("Completed '{}' for {}", habit.name, date)
    };

    Ok(CompleteHabitResponse {
        success: true,
        completion,
        current_streak,
        updated_existing,
        message,
    })
}

/// Mark a day as not done; a day without a record is left alone
pub fn uncomplete_habit<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: UncompleteHabitParams,
) -> Result<UncompleteHabitResponse, ToolError>
where
    S: UserStorage + HabitStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let habit = owned_habit(storage, &user.id, &params.habit_id)?;
    let date = parse_date_or_today(params.date.as_deref())?;

    let (completion, message) = match storage.get_completion(&habit.id, date)? {
        Some(mut record) => {
            record.mark_uncompleted();
            let stored = storage.upsert_completion(&record)?;
            (Some(stored), format!("Marked '{}' as not done for {}", habit.name, date))
        }
        None => (None, format!("'{}' had no record for {}; nothing to change", habit.name, date)),
    };

    let current_streak = analytics.current_streak(&storage.get_completions(&habit.id)?);

    Ok(UncompleteHabitResponse {
        success: true,
        completion,
        current_streak,
        message,
    })
}
