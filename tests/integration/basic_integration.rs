/// Basic integration tests
use fitness_tracker_mcp::mcp::protocol::error_codes;
use fitness_tracker_mcp::mcp::McpServer;
use fitness_tracker_mcp::*;
use serde_json::{json, Value};
use tempfile::NamedTempFile;

async fn mcp_server(temp_file: &NamedTempFile, environment: Environment) -> McpServer {
    let config = ServerConfig::new(temp_file.path().to_path_buf()).with_environment(environment);
    let server = FitnessTrackerServer::new(config).await.expect("Failed to create server");
    McpServer::new(server)
}

/// Send one request and return its `result`
fn request(server: &mut McpServer, id: u64, method: &str, params: Value) -> Value {
    let line = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }).to_string();
    let response = server.handle_line(&line).expect("request should get a response");
    assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
    response.result.expect("response should carry a result")
}

/// Call a tool; returns (is_error, error_code, payload)
fn call_tool(server: &mut McpServer, name: &str, arguments: Value) -> (bool, Option<i64>, Value) {
    let result = request(server, 1, "tools/call", json!({ "name": name, "arguments": arguments }));
    let text = result["content"][0]["text"].as_str().expect("text content").to_string();
    let payload = serde_json::from_str(&text).unwrap_or(Value::String(text));
    (
        result["isError"].as_bool().unwrap_or(false),
        result["errorCode"].as_i64(),
        payload,
    )
}

fn ok(server: &mut McpServer, name: &str, arguments: Value) -> Value {
    let (is_error, _, payload) = call_tool(server, name, arguments);
    assert!(!is_error, "{} failed: {}", name, payload);
    payload
}

fn register(server: &mut McpServer, username: &str) -> String {
    let payload = ok(server, "user_register", json!({ "username": username }));
    payload["user"]["id"].as_str().expect("user id").to_string()
}

#[cfg(test)]
mod basic_integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_initialize_and_list_tools() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let mut server = mcp_server(&temp_file, Environment::Development).await;

        let init = request(&mut server, 1, "initialize", json!({}));
        assert_eq!(init["serverInfo"]["name"], "Fitness Tracker MCP");
        assert!(init["capabilities"]["tools"].is_object());

        let notification = json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }).to_string();
        assert!(server.handle_line(&notification).is_none());
        assert!(server.is_initialized());

        let listed = request(&mut server, 2, "tools/list", json!({}));
        let names: Vec<&str> = listed["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        for expected in ["user_register", "habit_complete", "habit_analytics", "workout_start", "workout_end", "workout_records", "set_add"] {
            assert!(names.contains(&expected), "missing tool {}", expected);
        }
        let create = listed["tools"].as_array().unwrap().iter().find(|t| t["name"] == "habit_create").unwrap();
        assert!(create["inputSchema"]["properties"]["name"].is_object());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let mut server = mcp_server(&temp_file, Environment::Development).await;

        let parse = server.handle_line("{not json").unwrap();
        assert_eq!(parse.error.unwrap().code, error_codes::PARSE_ERROR);

        let unknown = server
            .handle_line(&json!({ "jsonrpc": "2.0", "id": 3, "method": "habits/everything" }).to_string())
            .unwrap();
        assert_eq!(unknown.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

        let old_version = server
            .handle_line(&json!({ "jsonrpc": "1.0", "id": 4, "method": "tools/list" }).to_string())
            .unwrap();
        assert_eq!(old_version.error.unwrap().code, error_codes::INVALID_REQUEST);

        let (is_error, code, _) = call_tool(&mut server, "no_such_tool", json!({}));
        assert!(is_error);
        assert_eq!(code, Some(error_codes::METHOD_NOT_FOUND as i64));

        let (is_error, code, _) = call_tool(&mut server, "habit_create", json!({ "name": "missing user" }));
        assert!(is_error);
        assert_eq!(code, Some(error_codes::VALIDATION_ERROR as i64));
    }

    #[tokio::test]
    async fn test_habit_workflow() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let mut server = mcp_server(&temp_file, Environment::Development).await;
        let user_id = register(&mut server, "alice");

        let created = ok(
            &mut server,
            "habit_create",
            json!({ "user_id": user_id, "name": "Drink water", "category": "health", "target_value": 8, "unit": "glasses" }),
        );
        let habit_id = created["habit"]["id"].as_str().unwrap().to_string();

        let first = ok(&mut server, "habit_complete", json!({ "user_id": user_id, "habit_id": habit_id, "value": 5 }));
        assert_eq!(first["updated_existing"], false);
        let second = ok(&mut server, "habit_complete", json!({ "user_id": user_id, "habit_id": habit_id, "value": 8 }));
        assert_eq!(second["updated_existing"], true);
        assert_eq!(second["current_streak"], 1);

        let analytics = ok(&mut server, "habit_analytics", json!({ "user_id": user_id, "habit_id": habit_id }));
        assert_eq!(analytics["analytics"]["totalCompletions"], 1);
        assert_eq!(analytics["analytics"]["completionRate"], 100.0);
        assert_eq!(analytics["analytics"]["heatmapData"].as_array().unwrap().len(), 30);

        let listed = ok(&mut server, "habit_list", json!({ "user_id": user_id }));
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["habits"][0]["completed_today"], true);

        // Another user can't see or touch the habit
        let intruder = register(&mut server, "mallory");
        let (is_error, code, _) = call_tool(
            &mut server,
            "habit_complete",
            json!({ "user_id": intruder, "habit_id": habit_id }),
        );
        assert!(is_error);
        assert_eq!(code, Some(error_codes::NOT_FOUND as i64));

        ok(&mut server, "habit_delete", json!({ "user_id": user_id, "habit_id": habit_id }));
        let (is_error, code, _) = call_tool(&mut server, "habit_get", json!({ "user_id": user_id, "habit_id": habit_id }));
        assert!(is_error);
        assert_eq!(code, Some(error_codes::NOT_FOUND as i64));
    }

    #[tokio::test]
    async fn test_workout_session_reports_records() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let mut server = mcp_server(&temp_file, Environment::Development).await;
        let user_id = register(&mut server, "bob");

        ok(
            &mut server,
            "workout_create",
            json!({
                "user_id": user_id,
                "name": "Legs",
                "exercises": [{ "name": "Squat", "muscle_group": "legs", "sets": [{ "reps": 5, "weight": 100 }] }]
            }),
        );

        let started = ok(&mut server, "workout_start", json!({ "user_id": user_id, "name": "Legs again" }));
        let workout_id = started["workout"]["id"].as_str().unwrap().to_string();

        let (is_error, code, _) = call_tool(&mut server, "workout_start", json!({ "user_id": user_id }));
        assert!(is_error);
        assert_eq!(code, Some(error_codes::VALIDATION_ERROR as i64));

        ok(
            &mut server,
            "exercise_add",
            json!({ "user_id": user_id, "workout_id": workout_id, "name": "squat", "muscle_group": "legs" }),
        );
        let with_set = ok(
            &mut server,
            "set_add",
            json!({ "user_id": user_id, "workout_id": workout_id, "exercise_index": 0, "reps": 5, "weight": 110 }),
        );
        assert_eq!(with_set["total_volume"], 550.0);

        let active = ok(&mut server, "workout_active", json!({ "user_id": user_id }));
        assert_eq!(active["workout"]["id"], workout_id.as_str());

        let ended = ok(&mut server, "workout_end", json!({ "user_id": user_id }));
        assert_eq!(ended["workout"]["status"], "completed");
        let breaks = ended["records_broken"].as_array().unwrap();
        assert!(breaks.iter().any(|b| b["dimension"] == "weight" && b["value"] == 110.0 && b["previous"] == 100.0));

        let records = ok(&mut server, "workout_records", json!({ "user_id": user_id, "exercise": "SQUAT" }));
        assert_eq!(records["report"]["records"][0]["maxWeight"]["value"], 110.0);

        let progress = ok(&mut server, "workout_analytics", json!({ "user_id": user_id }));
        assert_eq!(progress["analytics"]["totalWorkouts"], 2);

        let listed = ok(&mut server, "workout_list", json!({ "user_id": user_id, "status": "completed" }));
        assert_eq!(listed["workouts"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_health_reports_database() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let mut server = mcp_server(&temp_file, Environment::Production).await;

        let health = request(&mut server, 9, "health", json!({}));
        assert_eq!(health["status"], "ok");
        assert_eq!(health["environment"], "production");
        assert_eq!(health["database"]["connected"], true);

        let tool = ok(&mut server, "server_health", json!({}));
        assert_eq!(tool["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let user_id = {
            let mut server = mcp_server(&temp_file, Environment::Development).await;
            register(&mut server, "carol")
        };

        let mut reopened = mcp_server(&temp_file, Environment::Development).await;
        let user = ok(&mut reopened, "user_get", json!({ "user_id": user_id }));
        assert_eq!(user["user"]["username"], "carol");
    }
}
