/// Public library interface for the Fitness Tracker MCP server
///
/// This module exports the server implementation and the public types used
/// by the binary and by tests.

use std::time::Instant;

use serde::Serialize;
use thiserror::Error;

pub mod analytics;
pub mod config;
pub mod domain;
pub mod mcp;
pub mod storage;
pub mod tools;

pub use analytics::AnalyticsEngine;
pub use config::{Environment, ServerConfig};
pub use domain::*;
pub use storage::{HabitStorage, SqliteStorage, StorageError, UserStorage, WorkoutStorage};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Liveness report for the `health` method and `server_health` tool
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// "ok", or "degraded" when the database can't be reached
    pub status: &'static str,
    pub version: &'static str,
    pub environment: Environment,
    pub uptime_seconds: u64,
    pub database: DatabaseHealth,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fitness tracker server: storage, analytics and configuration
///
/// Users' habits and workouts live in a SQLite database; the MCP layer
/// turns tool calls into operations on this value.
pub struct FitnessTrackerServer {
    storage: SqliteStorage,
    analytics: AnalyticsEngine,
    config: ServerConfig,
    started_at: Instant,
}

impl FitnessTrackerServer {
    /// Open the configured database, creating the schema if needed
    pub async fn new(config: ServerConfig) -> Result<Self, ServerError> {
        tracing::info!(
            "Initializing Fitness Tracker server ({}) with database: {:?}",
            config.environment,
            config.database_path
        );

        let storage = SqliteStorage::new(config.database_path.clone())?;
        Ok(Self::with_storage(storage, config))
    }

    /// Build a server around an already opened store
    pub fn with_storage(storage: SqliteStorage, config: ServerConfig) -> Self {
        Self {
            storage,
            analytics: AnalyticsEngine::new(config.analytics_window_days),
            config,
            started_at: Instant::now(),
        }
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// Returns when stdin is closed.
    pub async fn run(self) -> Result<(), ServerError> {
        self.storage.ping()?;
        tracing::info!("Database reachable, starting MCP server");

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    pub fn analytics(&self) -> &AnalyticsEngine {
        &self.analytics
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn health(&self) -> HealthReport {
        let database = match self.storage.ping() {
            Ok(()) => DatabaseHealth { connected: true, error: None },
            Err(e) => {
                tracing::warn!("Health check failed to reach database: {}", e);
                DatabaseHealth {
                    connected: false,
                    error: if self.config.environment.is_production() {
                        None
                    } else {
                        Some(e.to_string())
                    },
                }
            }
        };

        HealthReport {
            status: if database.connected { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            environment: self.config.environment,
            uptime_seconds: self.started_at.elapsed().as_secs(),
            database,
        }
    }
}
