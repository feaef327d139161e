/// Tools for modifying and removing habits
///
/// This module implements the habit_update and habit_delete MCP tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, Frequency, GoalType, Habit, HabitUpdate};
use crate::storage::{HabitStorage, UserStorage};
use crate::tools::{goal_from_target, owned_habit, require_user, HabitRefParams, MessageResponse, ToolError};

/// Parameters for updating a habit; omitted fields are left unchanged
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateHabitParams {
    pub user_id: String,
    pub habit_id: String,
    pub name: Option<String>,
    /// Empty string removes the description
    pub description: Option<String>,
    pub category: Option<String>,
    pub frequency: Option<String>,
    /// New numeric target; the unit is kept unless `unit` is given too
    pub target_value: Option<f64>,
    pub unit: Option<String>,
    /// Turn the habit back into a done/not-done habit
    pub clear_target: Option<bool>,
    /// false archives the habit, true restores it
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct UpdateHabitResponse {
    pub success: bool,
    pub habit: Habit,
    pub message: String,
}

fn goal_change(habit: &Habit, params: &UpdateHabitParams) -> Result<Option<GoalType>, ToolError> {
    if params.clear_target == Some(true) {
        if params.target_value.is_some() {
            return Err(ToolError::Validation(
                "Use either target_value or clear_target, not both".to_string(),
            ));
        }
        return Ok(Some(GoalType::Boolean));
    }

    let current_unit = match &habit.goal {
        GoalType::Numeric { unit, .. } => unit.clone(),
        GoalType::Boolean => None,
    };
    match (params.target_value, &habit.goal) {
        (Some(target), _) => Ok(Some(goal_from_target(
            Some(target),
            params.unit.clone().or(current_unit),
        )?)),
        (None, GoalType::Numeric { target, .. }) if params.unit.is_some() => Ok(Some(GoalType::Numeric {
            target: *target,
            unit: params.unit.as_ref().map(|u| u.trim().to_string()),
        })),
        (None, GoalType::Boolean) if params.unit.is_some() => Err(ToolError::Validation(
            "A unit needs a target_value".to_string(),
        )),
        (None, _) => Ok(None),
    }
}

/// Update a habit's properties
pub fn update_habit<S>(storage: &S, params: UpdateHabitParams) -> Result<UpdateHabitResponse, ToolError>
where
    S: UserStorage + HabitStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let mut habit = owned_habit(storage, &user.id, &params.habit_id)?;

    let goal = goal_change(&habit, &params)?;
    let category = params.category.as_deref().map(str::parse::<Category>).transpose()?;
    let frequency = params.frequency.as_deref().map(str::parse::<Frequency>).transpose()?;
    let description = params
        .description
        .map(|d| Some(d.trim().to_string()).filter(|d| !d.is_empty()));

    habit.update(HabitUpdate {
        name: params.name,
        description,
        category,
        frequency,
        goal,
        is_active: params.is_active,
    })?;
    storage.update_habit(&habit)?;

    tracing::info!("Updated habit {} for user {}", habit.id, user.id);
    Ok(UpdateHabitResponse {
        success: true,
        message: format!("Updated habit '{}'", habit.name),
        habit,
    })
}

/// Permanently delete a habit and its completion history
pub fn delete_habit<S>(storage: &S, params: HabitRefParams) -> Result<MessageResponse, ToolError>
where
    S: UserStorage + HabitStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let habit = owned_habit(storage, &user.id, &params.habit_id)?;

    storage.delete_habit(&habit.id)?;

    tracing::info!("Deleted habit {} for user {}", habit.id, user.id);
    Ok(MessageResponse::new(format!("Deleted habit '{}' and its history", habit.name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::storage::SqliteStorage;
    use crate::tools::{create_habit, CreateHabitParams};

    fn setup() -> (SqliteStorage, String, String) {
        let storage = SqliteStorage::in_memory().unwrap();
        let user = User::new("updater".to_string(), None, None, None).unwrap();
        storage.create_user(&user).unwrap();

        let habit = create_habit(
            &storage,
            CreateHabitParams {
                user_id: user.id.to_string(),
                name: "Pushups".to_string(),
                description: Some("Before breakfast".to_string()),
                category: None,
                frequency: None,
                target_value: Some(20.0),
                unit: Some("reps".to_string()),
                start_date: None,
            },
        )
        .unwrap()
        .habit;
        (storage, user.id.to_string(), habit.id.to_string())
    }

    fn params(user_id: &str, habit_id: &str) -> UpdateHabitParams {
        UpdateHabitParams {
            user_id: user_id.to_string(),
            habit_id: habit_id.to_string(),
            name: None,
            description: None,
            category: None,
            frequency: None,
            target_value: None,
            unit: None,
            clear_target: None,
            is_active: None,
        }
    }

    #[test]
    fn test_new_target_keeps_unit() {
        let (storage, user_id, habit_id) = setup();

        let updated = update_habit(
            &storage,
            UpdateHabitParams { target_value: Some(30.0), description: Some(" ".to_string()), ..params(&user_id, &habit_id) },
        )
        .unwrap();
        assert_eq!(updated.habit.goal, GoalType::Numeric { target: 30.0, unit: Some("reps".to_string()) });
        assert_eq!(updated.habit.description, None);

        let cleared = update_habit(
            &storage,
            UpdateHabitParams { clear_target: Some(true), is_active: Some(false), ..params(&user_id, &habit_id) },
        )
        .unwrap();
        assert_eq!(cleared.habit.goal, GoalType::Boolean);
        assert!(!cleared.habit.is_active);
    }

    #[test]
    fn test_conflicting_goal_changes_rejected() {
        let (storage, user_id, habit_id) = setup();

        let result = update_habit(
            &storage,
            UpdateHabitParams { clear_target: Some(true), target_value: Some(5.0), ..params(&user_id, &habit_id) },
        );
        assert!(matches!(result, Err(ToolError::Validation(_))));
    }

    #[test]
    fn test_delete_removes_habit() {
        let (storage, user_id, habit_id) = setup();

        delete_habit(&storage, HabitRefParams { user_id: user_id.clone(), habit_id: habit_id.clone() }).unwrap();
        let again = delete_habit(&storage, HabitRefParams { user_id, habit_id });
        assert!(matches!(again, Err(ToolError::NotFound { .. })));
    }
}
