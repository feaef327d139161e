/// Tool for habit streak analytics
///
/// This module implements the habit_analytics MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use crate::analytics::MAX_WINDOW_DAYS;

use crate::analytics::{AnalyticsEngine, HabitAnalytics};
use crate::storage::{HabitStorage, UserStorage};
use crate::tools::{owned_habit, require_user, ToolError};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct HabitAnalyticsParams {
    pub user_id: String,
    pub habit_id: String,
    /// Lookback window for completion rate and weekday counts (1-365, default from server config)
    pub window_days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HabitAnalyticsResponse {
    pub success: bool,
    pub habit_name: String,
    pub analytics: HabitAnalytics,
    pub message: String,
}

/// Streaks, completion rate, weekday histogram and 30-day heatmap for one habit
pub fn habit_analytics<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: HabitAnalyticsParams,
) -> Result<HabitAnalyticsResponse, ToolError>
where
    S: UserStorage + HabitStorage,
{
    if let Some(days) = params.window_days {
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(ToolError::Validation(format!(
                "window_days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
    }

    let user = require_user(storage, &params.user_id)?;
    let habit = owned_habit(storage, &user.id, &params.habit_id)?;
    let completions = storage.get_completions(&habit.id)?;

    let report = analytics.habit_analytics(&habit, &completions, params.window_days);
    let message = format!(
        "'{}': {:.1}% over the last {} days, current streak {}, longest {}",
        habit.name, report.completion_rate, report.window_days, report.current_streak, report.longest_streak
    );

    Ok(HabitAnalyticsResponse {
        success: true,
        habit_name: habit.name,
        analytics: report,
        message,
    })
}
