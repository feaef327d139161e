/// Tool for creating new habits
///
/// This module implements the habit_create MCP tool.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, Frequency, GoalType, Habit};
use crate::storage::{HabitStorage, UserStorage};
use crate::tools::{parse_date_or_today, require_user, ToolError};

/// Parameters for creating a new habit
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateHabitParams {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    /// health, fitness, productivity, mindfulness, learning, social, finance,
    /// personal, or custom:<name> (default: personal)
    pub category: Option<String>,
    /// daily, weekly:<1-7> or days:<mon,wed,...> (default: daily)
    pub frequency: Option<String>,
    /// Numeric daily target; omit for a done/not-done habit
    pub target_value: Option<f64>,
    pub unit: Option<String>,
    /// YYYY-MM-DD, defaults to today
    pub start_date: Option<String>,
}

/// Response from creating a habit
#[derive(Debug, Serialize)]
pub struct CreateHabitResponse {
    pub success: bool,
    pub habit: Habit,
    pub message: String,
}

/// Build the goal from the optional target fields
pub(crate) fn goal_from_target(target_value: Option<f64>, unit: Option<String>) -> Result<GoalType, ToolError> {
    match target_value {
        Some(target) => Ok(GoalType::Numeric {
            target,
            unit: unit.map(|u| u.trim().to_string()),
        }),
        None if unit.is_some() => Err(ToolError::Validation(
            "A unit needs a target_value".to_string(),
        )),
        None => Ok(GoalType::Boolean),
    }
}

/// Create a new habit for the acting user
pub fn create_habit<S>(storage: &S, params: CreateHabitParams) -> Result<CreateHabitResponse, ToolError>
where
    S: UserStorage + HabitStorage,
{
    let user = require_user(storage, &params.user_id)?;

    let category: Category = params.category.as_deref().unwrap_or("personal").parse()?;
    let frequency: Frequency = params.frequency.as_deref().unwrap_or("daily").parse()?;
    let goal = goal_from_target(params.target_value, params.unit)?;

    let mut habit = Habit::new(user.id, params.name, params.description, category, frequency, goal)?;
    if let Some(raw) = params.start_date.as_deref() {
        habit = habit.with_start_date(parse_date_or_today(Some(raw))?);
    }

    storage.create_habit(&habit)?;
    tracing::info!("Created habit '{}' ({}) for user {}", habit.name, habit.id, habit.user_id);

    Ok(CreateHabitResponse {
        success: true,
        message: format!(
            "Created habit '{}' ({}). Ready to start your streak!",
            habit.name,
            habit.frequency.describe()
        ),
        habit,
    })
}
