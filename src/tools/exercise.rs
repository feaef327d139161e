/// Tools for editing the exercises and sets inside a workout
///
/// Implements exercise_add, exercise_remove, set_add, set_update and
/// set_remove. Exercises and sets are addressed by their zero-based position.

use schemars::JsonSchema;
use serde::Deserialize;

use crate::domain::{DomainError, Exercise, ExerciseSet};
use crate::storage::{UserStorage, WorkoutStorage};
use crate::tools::{owned_workout, require_user, ToolError, WorkoutResponse};

/// One set as sent by a client
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SetInput {
    pub reps: u32,
    /// Load in the user's weight unit; 0 for bodyweight
    pub weight: f64,
    pub rest_seconds: Option<u32>,
    /// Rate of perceived exertion, 1-10
    pub rpe: Option<u8>,
}

impl SetInput {
    pub fn into_set(self) -> Result<ExerciseSet, DomainError> {
        ExerciseSet::new(self.reps, self.weight, self.rest_seconds, self.rpe)
    }
}

/// One exercise as sent by a client
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExerciseInput {
    pub name: String,
    pub muscle_group: Option<String>,
    pub equipment: Option<String>,
    #[serde(default)]
    pub sets: Vec<SetInput>,
    pub notes: Option<String>,
}

impl ExerciseInput {
    pub fn into_exercise(self) -> Result<Exercise, DomainError> {
        let sets = self
            .sets
            .into_iter()
            .map(SetInput::into_set)
            .collect::<Result<Vec<_>, _>>()?;
        let mut exercise = Exercise::new(self.name, self.muscle_group, self.equipment, sets)?;
        exercise.notes = self.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        Ok(exercise)
    }
}

pub(crate) fn exercises_from_input(inputs: Vec<ExerciseInput>) -> Result<Vec<Exercise>, DomainError> {
    inputs.into_iter().map(ExerciseInput::into_exercise).collect()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddExerciseParams {
    pub user_id: String,
    pub workout_id: String,
    #[serde(flatten)]
    pub exercise: ExerciseInput,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveExerciseParams {
    pub user_id: String,
    pub workout_id: String,
    pub exercise_index: usize,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddSetParams {
    pub user_id: String,
    pub workout_id: String,
    pub exercise_index: usize,
    #[serde(flatten)]
    pub set: SetInput,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateSetParams {
    pub user_id: String,
    pub workout_id: String,
    pub exercise_index: usize,
    pub set_index: usize,
    #[serde(flatten)]
    pub set: SetInput,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RemoveSetParams {
    pub user_id: String,
    pub workout_id: String,
    pub exercise_index: usize,
    pub set_index: usize,
}

pub fn add_exercise<S>(storage: &S, params: AddExerciseParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let mut workout = owned_workout(storage, &user.id, &params.workout_id)?;

    let exercise = params.exercise.into_exercise()?;
    let name = exercise.name.clone();
    let index = workout.add_exercise(exercise)?;
    storage.update_workout(&workout)?;

    Ok(WorkoutResponse::new(
        workout,
        format!("Added {} as exercise {}", name, index),
    ))
}

pub fn remove_exercise<S>(storage: &S, params: RemoveExerciseParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let mut workout = owned_workout(storage, &user.id, &params.workout_id)?;

    let removed = workout.remove_exercise(params.exercise_index)?;
    storage.update_workout(&workout)?;

    Ok(WorkoutResponse::new(workout, format!("Removed {}", removed.name)))
}

pub fn add_set<S>(storage: &S, params: AddSetParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let mut workout = owned_workout(storage, &user.id, &params.workout_id)?;

    let set = params.set.into_set()?;
    let summary = format!("{} x {}", set.reps, set.weight);
    let set_index = workout.add_set(params.exercise_index, set)?;
    storage.update_workout(&workout)?;

    let exercise = &workout.exercises[params.exercise_index].name;
    let message = format!("Logged set {} of {}: {}", set_index + 1, exercise, summary);
    Ok(WorkoutResponse::new(workout, message))
}

pub fn update_set<S>(storage: &S, params: UpdateSetParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let mut workout = owned_workout(storage, &user.id, &params.workout_id)?;

    let set = params.set.into_set()?;
    workout.update_set(params.exercise_index, params.set_index, set)?;
    storage.update_workout(&workout)?;

    Ok(WorkoutResponse::new(workout, format!("Updated set {}", params.set_index + 1)))
}

pub fn remove_set<S>(storage: &S, params: RemoveSetParams) -> Result<WorkoutResponse, ToolError>
where
    S: UserStorage + WorkoutStorage,
{
    let user = require_user(storage, &params.user_id)?;
    let mut workout = owned_workout(storage, &user.id, &params.workout_id)?;

    workout.remove_set(params.exercise_index, params.set_index)?;
    storage.update_workout(&workout)?;

    Ok(WorkoutResponse::new(workout, format!("Removed set {}", params.set_index + 1)))
}
