/// MCP server implementation that handles JSON-RPC communication
///
/// This module implements the actual MCP server that:
/// 1. Reads JSON-RPC requests from stdin, one per line
/// 2. Routes tool calls to the fitness tracker tools
/// 3. Writes JSON-RPC responses to stdout

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::tools::{self, ErrorKind, ToolError};
use crate::{FitnessTrackerServer, ServerError};

/// MCP server that handles communication with the client
pub struct McpServer {
    tracker: FitnessTrackerServer,
    /// Whether the client has completed the initialize handshake
    initialized: bool,
}

impl McpServer {
    pub fn new(tracker: FitnessTrackerServer) -> Self {
        Self {
            tracker,
            initialized: false,
        }
    }

    pub fn tracker(&self) -> &FitnessTrackerServer {
        &self.tracker
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.handle_line(&line) {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Process a single line of JSON-RPC input
    ///
    /// Returns `None` for blank lines and notifications.
    pub fn handle_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                request.id.unwrap_or(Value::Null),
                error_codes::INVALID_REQUEST,
                format!("Unsupported JSON-RPC version '{}'", request.jsonrpc),
                None,
            ));
        }

        let Some(id) = request.id.clone() else {
            self.handle_notification(&request.method);
            return None;
        };

        Some(self.handle_request(id, request))
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                info!("MCP client finished initialization");
            }
            other => debug!("Ignoring notification '{}'", other),
        }
    }

    fn handle_request(&mut self, id: Value, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(id, Value::Null)
            }
            "ping" => JsonRpcResponse::success(id, json!({})),
            "health" => to_response(id, &self.tracker.health()),
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        }
    }

    fn handle_initialize(&mut self, id: Value) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Fitness Tracker MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(id, &result)
    }

    fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        let result = self.call_tool(&tool_params.name, Value::Object(tool_params.arguments));
        to_response(id, &result)
    }

    /// Route a tool call by name
    fn call_tool(&self, name: &str, args: Value) -> ToolCallResult {
        let t = &self.tracker;
        let storage = t.storage();
        let analytics = t.analytics();

        debug!("Calling tool '{}'", name);
        match name {
            // Users
            "user_register" => self.invoke(args, |p| tools::register_user(storage, p)),
            "user_get" => self.invoke(args, |p| tools::get_user(storage, p)),
            "user_update" => self.invoke(args, |p| tools::update_user(storage, p)),
            "user_stats" => self.invoke(args, |p| tools::user_stats(storage, analytics, p)),

            // Habits
            "habit_create" => self.invoke(args, |p| tools::create_habit(storage, p)),
            "habit_list" => self.invoke(args, |p| tools::list_habits(storage, analytics, p)),
            "habit_get" => self.invoke(args, |p| tools::get_habit(storage, analytics, p)),
            "habit_update" => self.invoke(args, |p| tools::update_habit(storage, p)),
            "habit_delete" => self.invoke(args, |p| tools::delete_habit(storage, p)),
            "habit_complete" => self.invoke(args, |p| tools::complete_habit(storage, analytics, p)),
            "habit_uncomplete" => self.invoke(args, |p| tools::uncomplete_habit(storage, analytics, p)),
            "habit_analytics" => self.invoke(args, |p| tools::habit_analytics(storage, analytics, p)),

            // Workouts
            "workout_create" => self.invoke(args, |p| tools::create_workout(storage, p)),
            "workout_list" => self.invoke(args, |p| tools::list_workouts(storage, p)),
            "workout_get" => self.invoke(args, |p| tools::get_workout(storage, p)),
            "workout_update" => self.invoke(args, |p| tools::update_workout(storage, p)),
            "workout_delete" => self.invoke(args, |p| tools::delete_workout(storage, p)),
            "workout_start" => self.invoke(args, |p| tools::start_workout(storage, p)),
            "workout_pause" => self.invoke(args, |p| tools::pause_workout(storage, p)),
            "workout_resume" => self.invoke(args, |p| tools::resume_workout(storage, p)),
            "workout_end" => self.invoke(args, |p| tools::end_workout(storage, analytics, p)),
            "workout_active" => self.invoke(args, |p| tools::active_workout(storage, p)),

            // Exercises and sets
            "exercise_add" => self.invoke(args, |p| tools::add_exercise(storage, p)),
            "exercise_remove" => self.invoke(args, |p| tools::remove_exercise(storage, p)),
            "set_add" => self.invoke(args, |p| tools::add_set(storage, p)),
            "set_update" => self.invoke(args, |p| tools::update_set(storage, p)),
            "set_remove" => self.invoke(args, |p| tools::remove_set(storage, p)),

            // Progress
            "workout_analytics" => self.invoke(args, |p| tools::workout_analytics(storage, analytics, p)),
            "workout_records" => self.invoke(args, |p| tools::workout_records(storage, analytics, p)),
            "exercise_library" => self.invoke(args, |p| tools::exercise_library(storage, p)),

            "server_health" => self.invoke(args, |_: NoParams| Ok(t.health())),

            _ => ToolCallResult::error(
                error_codes::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", name),
            ),
        }
    }

    /// Deserialize the arguments, run the tool and render its response as JSON text
    fn invoke<P, R, F>(&self, args: Value, tool: F) -> ToolCallResult
    where
        P: DeserializeOwned,
        R: Serialize,
        F: FnOnce(P) -> Result<R, ToolError>,
    {
        let outcome = serde_json::from_value::<P>(args)
            .map_err(|e| ToolError::Validation(format!("Invalid arguments: {}", e)))
            .and_then(tool)
            .and_then(|response| {
                serde_json::to_string_pretty(&response)
                    .map_err(|e| ToolError::Internal(format!("Failed to encode response: {}", e)))
            });

        match outcome {
            Ok(text) => ToolCallResult::success(text),
            Err(e) => {
                let environment = self.tracker.config().environment;
                match e.kind() {
                    ErrorKind::Internal => error!("Tool call failed: {}", e),
                    _ => debug!("Tool call rejected: {}", e),
                }
                ToolCallResult::error(error_code_for(e.kind()), e.public_message(environment))
            }
        }
    }
}

fn to_response<T: Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => {
            error!("Failed to encode result: {}", e);
            JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, "Internal server error".to_string(), None)
        }
    }
}

/// Every tool this server exposes, with input schemas generated from the parameter types
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new::<tools::RegisterUserParams>("user_register", "Register a new user and get their user ID"),
        ToolDefinition::new::<tools::UserRefParams>("user_get", "Show a user's profile"),
        ToolDefinition::new::<tools::UpdateUserParams>("user_update", "Change display name, email or weight unit"),
        ToolDefinition::new::<tools::UserRefParams>("user_stats", "Totals across all of a user's habits and workouts"),
        ToolDefinition::new::<tools::CreateHabitParams>("habit_create", "Create a new habit to track"),
        ToolDefinition::new::<tools::ListHabitsParams>(
            "habit_list",
            "List habits with current streaks and whether each is due and done today",
        ),
        ToolDefinition::new::<tools::HabitRefParams>("habit_get", "Show one habit with its recent completions"),
        ToolDefinition::new::<tools::UpdateHabitParams>("habit_update", "Change a habit's settings or archive it"),
        ToolDefinition::new::<tools::HabitRefParams>("habit_delete", "Permanently delete a habit and its history"),
        ToolDefinition::new::<tools::CompleteHabitParams>(
            "habit_complete",
            "Mark a habit done for today or a past date (repeat calls update the same day)",
        ),
        ToolDefinition::new::<tools::UncompleteHabitParams>("habit_uncomplete", "Mark a day as not done"),
        ToolDefinition::new::<tools::HabitAnalyticsParams>(
            "habit_analytics",
            "Completion rate, streaks, weekday counts and a 30-day heatmap for a habit",
        ),
        ToolDefinition::new::<tools::CreateWorkoutParams>("workout_create", "Log a finished workout or plan one"),
        ToolDefinition::new::<tools::ListWorkoutsParams>("workout_list", "List workouts, newest first"),
        ToolDefinition::new::<tools::WorkoutRefParams>("workout_get", "Show a workout with its exercises and sets"),
        ToolDefinition::new::<tools::UpdateWorkoutParams>("workout_update", "Edit a workout's name, date, notes or exercises"),
        ToolDefinition::new::<tools::WorkoutRefParams>("workout_delete", "Delete a workout"),
        ToolDefinition::new::<tools::StartWorkoutParams>(
            "workout_start",
            "Start a live workout (only one can be in progress)",
        ),
        ToolDefinition::new::<tools::WorkoutActionParams>("workout_pause", "Pause the workout in progress"),
        ToolDefinition::new::<tools::WorkoutActionParams>("workout_resume", "Resume a paused workout"),
        ToolDefinition::new::<tools::WorkoutActionParams>(
            "workout_end",
            "Finish a workout and report any personal records it set",
        ),
        ToolDefinition::new::<tools::UserRefParams>("workout_active", "Show the workout in progress, if any"),
        ToolDefinition::new::<tools::AddExerciseParams>("exercise_add", "Add an exercise to a workout"),
        ToolDefinition::new::<tools::RemoveExerciseParams>("exercise_remove", "Remove an exercise from a workout"),
        ToolDefinition::new::<tools::AddSetParams>("set_add", "Log a set for an exercise"),
        ToolDefinition::new::<tools::UpdateSetParams>("set_update", "Correct a logged set"),
        ToolDefinition::new::<tools::RemoveSetParams>("set_remove", "Remove a logged set"),
        ToolDefinition::new::<tools::WorkoutAnalyticsParams>(
            "workout_analytics",
            "Per-exercise progression with estimated 1RM, muscle-group and weekly volume",
        ),
        ToolDefinition::new::<tools::WorkoutRecordsParams>("workout_records", "Personal records per exercise"),
        ToolDefinition::new::<tools::ExerciseLibraryParams>("exercise_library", "Search exercises you have done before"),
        ToolDefinition::new::<NoParams>("server_health", "Server status, version, uptime and database connectivity"),
    ]
}
