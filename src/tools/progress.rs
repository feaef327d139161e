/// Tools for training progress
///
/// Implements workout_analytics, workout_records and exercise_library.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsEngine, RecordsReport, WorkoutAnalytics, WorkoutFilter, MAX_WINDOW_DAYS};
use crate::domain::WorkoutStatus;
use crate::storage::{LibraryExercise, UserStorage, WorkoutStorage};
use crate::tools::{require_user, ToolError};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WorkoutAnalyticsParams {
    pub user_id: String,
    /// Only this exercise (case-insensitive)
    pub exercise: Option<String>,
    /// Only exercises tagged with this muscle group
    pub muscle_group: Option<String>,
    /// Only workouts from the last N days, today included (1-365)
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WorkoutRecordsParams {
    pub user_id: String,
    /// Only records for this exercise (case-insensitive)
    pub exercise: Option<String>,
    /// Most recent record breaks to include (default 10)
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExerciseLibraryParams {
    pub user_id: String,
    /// Substring of the exercise name
    pub query: Option<String>,
    pub muscle_group: Option<String>,
    /// Default 25
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutAnalyticsResponse {
    pub success: bool,
    pub analytics: WorkoutAnalytics,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct WorkoutRecordsResponse {
    pub success: bool,
    pub report: RecordsReport,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ExerciseLibraryResponse {
    pub success: bool,
    pub exercises: Vec<LibraryExercise>,
    pub message: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Progression, muscle-group volume and weekly volume over completed workouts
pub fn workout_analytics<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: WorkoutAnalyticsParams,
) -> Result<WorkoutAnalyticsResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    if let Some(days) = params.days {
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(ToolError::Validation(format!(
                "days must be between 1 and {}",
                MAX_WINDOW_DAYS
            )));
        }
    }

    let user = require_user(storage, &params.user_id)?;
    let history = storage.list_workouts(&user.id, Some(WorkoutStatus::Completed), None)?;

    let filter = WorkoutFilter {
        exercise: non_blank(params.exercise),
        muscle_group: non_blank(params.muscle_group),
        days: params.days,
    };
    let report = analytics.workout_analytics(&history, &filter);

    let message = format!(
        "{} workouts, {:.1} total volume, {} exercises tracked",
        report.total_workouts,
        report.total_volume,
        report.progression.len()
    );
    Ok(WorkoutAnalyticsResponse {
        success: true,
        analytics: report,
        message,
    })
}

/// Personal records per exercise and the history of record breaks
pub fn workout_records<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: WorkoutRecordsParams,
) -> Result<WorkoutRecordsResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let history = storage.list_workouts(&user.id, Some(WorkoutStatus::Completed), None)?;

    let exercise = non_blank(params.exercise);
    let report = analytics.personal_records(&history, exercise.as_deref(), params.limit.unwrap_or(10));

    let message = match report.records.len() {
        0 => "No personal records yet. Complete a workout to set some!".to_string(),
        n => format!("Personal records for {} exercises", n),
    };
    Ok(WorkoutRecordsResponse {
        success: true,
        report,
        message,
    })
}

/// Exercises the user has done before, most used first
pub fn exercise_library<S>(storage: &S, params: ExerciseLibraryParams) -> Result<ExerciseLibraryResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let query = non_blank(params.query);
    let muscle_group = non_blank(params.muscle_group).map(|m| m.to_lowercase());
    let limit = params.limit.unwrap_or(25).clamp(1, 200);

    let exercises = storage.search_exercise_library(&user.id, query.as_deref(), muscle_group.as_deref(), limit)?;

    let message = format!("{} exercises found", exercises.len());
    Ok(ExerciseLibraryResponse {
        success: true,
        exercises,
        message,
    })
}
