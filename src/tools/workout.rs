/// Tools for workouts and their lifecycle
///
/// Implements workout_create, workout_list, workout_get, workout_update,
/// workout_delete, workout_start, workout_pause, workout_resume, workout_end
/// and workout_active.

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsEngine, RecordBreak};
use crate::domain::{DomainError, UserId, Workout, WorkoutStatus};
use crate::storage::{UserStorage, WorkoutStorage};
use crate::tools::{
    exercises_from_input, owned_workout, parse_date_or_today, require_user, ExerciseInput,
    MessageResponse, ToolError, UserRefParams,
};

/// Parameters for recording a workout that isn't run live
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateWorkoutParams {
    pub user_id: String,
    pub name: String,
    /// YYYY-MM-DD, defaults to today
    pub date: Option<String>,
    /// At least one exercise
    pub exercises: Vec<ExerciseInput>,
    /// true logs a finished workout (default), false plans one for later
    pub completed: Option<bool>,
    pub duration_seconds: Option<i64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListWorkoutsParams {
    pub user_id: String,
    /// planned, active, paused or completed
    pub status: Option<String>,
    /// Newest first; default 20
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WorkoutRefParams {
    pub user_id: String,
    pub workout_id: String,
}

/// Parameters for pause, resume and end
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WorkoutActionParams {
    pub user_id: String,
    /// Defaults to the user's in-progress workout
    pub workout_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StartWorkoutParams {
    pub user_id: String,
    /// Start this planned workout instead of a new empty one
    pub workout_id: Option<String>,
    /// Name for a new workout (default: "Workout <date>")
    pub name: Option<String>,
}

/// Parameters for editing a workout; omitted fields are left unchanged
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateWorkoutParams {
    pub user_id: String,
    pub workout_id: String,
    pub name: Option<String>,
    /// YYYY-MM-DD
    pub date: Option<String>,
    /// Empty string removes the notes
    pub notes: Option<String>,
    /// Replaces the whole exercise list
    pub exercises: Option<Vec<ExerciseInput>>,
}

#[derive(Debug, Serialize)]
pub struct WorkoutResponse {
    pub success: bool,
    pub workout: Workout,
    pub total_volume: f64,
    pub total_sets: usize,
    /// Active time so far, including a running segment
    pub elapsed_seconds: i64,
    pub message: String,
}

impl WorkoutResponse {
    pub fn new(workout: Workout, message: String) -> Self {
        Self {
            success: true,
            total_volume: workout.total_volume(),
            total_sets: workout.total_sets(),
            elapsed_seconds: workout.elapsed_seconds(Utc::now()),
            workout,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkoutSummary {
    pub workout_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub status: WorkoutStatus,
    pub exercise_count: usize,
    pub total_sets: usize,
    pub total_volume: f64,
    pub duration_seconds: i64,
}

impl From<&Workout> for WorkoutSummary {
    fn from(workout: &Workout) -> Self {
        Self {
            workout_id: workout.id.to_string(),
            name: workout.name.clone(),
            date: workout.date,
            status: workout.status,
            exercise_count: workout.exercises.len(),
            total_sets: workout.total_sets(),
            total_volume: workout.total_volume(),
            duration_seconds: workout.duration_seconds,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListWorkoutsResponse {
    pub success: bool,
    pub workouts: Vec<WorkoutSummary>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct EndWorkoutResponse {
    pub success: bool,
    pub workout: Workout,
    pub total_volume: f64,
    pub duration_seconds: i64,
    /// Personal records this workout set or matched
    pub records_broken: Vec<RecordBreak>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveWorkoutResponse {
    pub success: bool,
    pub workout: Option<Workout>,
    pub elapsed_seconds: Option<i64>,
    pub message: String,
}

const DEFAULT_LIST_LIMIT: u32 = 20;

fn clean_notes(notes: Option<String>) -> Option<String> {
    notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}

/// The workout named by `workout_id`, or the user's in-progress one
fn target_workout<S: WorkoutStorage>(
    storage: &S,
    user_id: &UserId,
    workout_id: Option<&str>,
) -> Result<Workout, ToolError> {
    match workout_id {
        Some(id) => owned_workout(storage, user_id, id),
        None => storage
            .find_in_progress_workout(user_id)?
            .ok_or_else(|| ToolError::NotFound { entity: "Workout", id: "in progress".to_string() }),
    }
}

/// Log a finished workout or plan one
pub fn create_workout<S>(storage: &S, params: CreateWorkoutParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let date = parse_date_or_today(params.date.as_deref())?;
    let completed = params.completed.unwrap_or(true);
    if completed && date > Utc::now().date_naive() {
        return Err(ToolError::Validation("Cannot log a completed workout in the future".to_string()));
    }

    let exercises = exercises_from_input(params.exercises)?;
    let mut workout = Workout::new(user.id, params.name, date, exercises, completed, params.duration_seconds)?;
    workout.notes = clean_notes(params.notes);

    storage.create_workout(&workout)?;
    if completed {
        storage.record_exercise_usage(&workout)?;
    }

    tracing::info!("Created {} workout {} for user {}", workout.status, workout.id, workout.user_id);
    let message = format!(
        "{} '{}' on {} with {} exercises",
        if completed { "Logged" } else { "Planned" },
        workout.name,
        workout.date,
        workout.exercises.len()
    );
    Ok(WorkoutResponse::new(workout, message))
}

pub fn list_workouts<S>(storage: &S, params: ListWorkoutsParams) -> Result<ListWorkoutsResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let status = params
        .status
        .as_deref()
        .map(str::parse::<WorkoutStatus>)
        .transpose()?;
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 500);

    let workouts = storage.list_workouts(&user.id, status, Some(limit))?;
    let summaries: Vec<WorkoutSummary> = workouts.iter().map(WorkoutSummary::from).collect();

    let message = if summaries.is_empty() {
        "No workouts found".to_string()
    } else {
        format!("{} workouts", summaries.len())
    };
    Ok(ListWorkoutsResponse {
        success: true,
        workouts: summaries,
        message,
    })
}

pub fn get_workout<S>(storage: &S, params: WorkoutRefParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let workout = owned_workout(storage, &user.id, &params.workout_id)?;

    let message = format!("'{}' on {} ({})", workout.name, workout.date, workout.status);
    Ok(WorkoutResponse::new(workout, message))
}

pub fn update_workout<S>(storage: &S, params: UpdateWorkoutParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let mut workout = owned_workout(storage, &user.id, &params.workout_id)?;

    // Validate everything before changing anything
    let date = params
        .date
        .as_deref()
        .map(|d| parse_date_or_today(Some(d)))
        .transpose()?;
    if let Some(date) = date {
        if workout.status == WorkoutStatus::Completed && date > Utc::now().date_naive() {
            return Err(ToolError::Validation("A completed workout cannot be dated in the future".to_string()));
        }
    }
    let exercises = params.exercises.map(exercises_from_input).transpose()?;

    if let Some(name) = params.name {
        workout.rename(name)?;
    }
    if let Some(exercises) = exercises {
        workout.replace_exercises(exercises)?;
    }
    if let Some(date) = date {
        workout.date = date;
    }
    if let Some(notes) = params.notes {
        workout.notes = clean_notes(Some(notes));
    }

    storage.update_workout(&workout)?;
    Ok(WorkoutResponse::new(workout, "Workout updated".to_string()))
}

pub fn delete_workout<S>(storage: &S, params: WorkoutRefParams) -> Result<MessageResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let workout = owned_workout(storage, &user.id, &params.workout_id)?;

    storage.delete_workout(&workout.id)?;

    tracing::info!("Deleted workout {} for user {}", workout.id, user.id);
    Ok(MessageResponse::new(format!("Deleted workout '{}'", workout.name)))
}

/// Begin a new live workout, or start a planned one
///
/// Rejected while the user has another workout active or paused.
pub fn start_workout<S>(storage: &S, params: StartWorkoutParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let now = Utc::now();

    let workout = match params.workout_id.as_deref() {
        Some(id) => {
            let mut planned = owned_workout(storage, &user.id, id)?;
            planned.start(now)?;
            planned
        }
        None => Workout::begin(user.id.clone(), params.name, now)?,
    };
    storage.save_in_progress_workout(&workout)?;

    tracing::info!("Started workout {} for user {}", workout.id, user.id);
    let message = format!("Started '{}'", workout.name);
    Ok(WorkoutResponse::new(workout, message))
}

pub fn pause_workout<S>(storage: &S, params: WorkoutActionParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    transition(storage, params, "Paused", |workout, now| workout.pause(now))
}

pub fn resume_workout<S>(storage: &S, params: WorkoutActionParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    transition(storage, params, "Resumed", |workout, now| workout.resume(now))
}

fn transition<S, F>(
    storage: &S,
    params: WorkoutActionParams,
    verb: &str,
    apply: F,
) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
    F: FnOnce(&mut Workout, DateTime<Utc>) -> Result<(), DomainError>,
{
    let user = require_user(storage, &params.user_id)?;
    let mut workout = target_workout(storage, &user.id, params.workout_id.as_deref())?;

    apply(&mut workout, Utc::now())?;
    storage.update_workout(&workout)?;

    tracing::debug!("{} workout {}", verb, workout.id);
    let message = format!("{} '{}'", verb, workout.name);
    Ok(WorkoutResponse::new(workout, message))
}

/// Finish a workout and report the personal records it broke
pub fn end_workout<S>(
    storage: &S,
    analytics: &AnalyticsEngine,
    params: WorkoutActionParams,
) -> Result<EndWorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let mut workout = target_workout(storage, &user.id, params.workout_id.as_deref())?;

    workout.finish(Utc::now())?;
    storage.update_workout(&workout)?;
    storage.record_exercise_usage(&workout)?;

    let history = storage.list_workouts(&user.id, Some(WorkoutStatus::Completed), None)?;
    let records_broken = analytics.records_broken_by(&history, &workout);

    tracing::info!(
        "Ended workout {} for user {} ({} records broken)",
        workout.id,
        user.id,
        records_broken.len()
    );

    let minutes = workout.duration_seconds / 60;
    let message = if records_broken.is_empty() {
        format!("Finished '{}' in {} min", workout.name, minutes)
    } else {
        format!(
            "Finished '{}' in {} min with {} new personal records!",
            workout.name,
            minutes,
            records_broken.len()
        )
    };

    Ok(EndWorkoutResponse {
        success: true,
        total_volume: workout.total_volume(),
        duration_seconds: workout.duration_seconds,
        workout,
        records_broken,
        message,
    })
}

/// The user's active or paused workout, if any
pub fn active_workout<S>(storage: &S, params: UserRefParams) -> Result<ActiveWorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let workout = storage.find_in_progress_workout(&user.id)?;

    let elapsed_seconds = workout.as_ref().map(|w| w.elapsed_seconds(Utc::now()));
    let message = match &workout {
        Some(w) => format!("'{}' is {}", w.name, w.status),
        None => "No workout in progress".to_string(),
    };

    Ok(ActiveWorkoutResponse {
        success: true,
        workout,
        elapsed_seconds,
        message,
    })
}
