/// Server configuration
///
/// Collected from command line flags and environment variables in `main`
/// and handed to the server as one value.

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use crate::analytics::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};

/// Deployment environment; controls how much error detail clients see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub environment: Environment,
    /// Default lookback window for habit analytics
    pub analytics_window_days: u32,
}

impl ServerConfig {
    /// Development settings with the default analytics window
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            database_path,
            environment: Environment::default(),
            analytics_window_days: DEFAULT_WINDOW_DAYS,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Clamped to 1..=MAX_WINDOW_DAYS
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.analytics_window_days = days.clamp(1, MAX_WINDOW_DAYS);
        self
    }
}

/// Pick a writable location for the database file
///
/// Tries the home, data, config and working directories in that order and
/// falls back to the temp directory.
pub fn default_database_path() -> std::io::Result<PathBuf> {
    let candidates = [
        dirs::home_dir().map(|p| p.join(".fitness_tracker")),
        dirs::data_dir().map(|p| p.join("fitness_tracker")),
        dirs::config_dir().map(|p| p.join("fitness_tracker")),
        std::env::current_dir().ok().map(|p| p.join(".fitness_tracker")),
    ];

    for dir in candidates.iter().flatten() {
        if std::fs::create_dir_all(dir).is_err() {
            continue;
        }
        let probe = dir.join(".write_test");
        if std::fs::write(&probe, b"ok").is_ok() {
            let _ = std::fs::remove_file(&probe);
            return Ok(dir.join("fitness.db"));
        }
    }

    let fallback = std::env::temp_dir().join("fitness_tracker");
    std::fs::create_dir_all(&fallback)?;
    tracing::warn!("Using temporary directory for database: {}", fallback.display());
    Ok(fallback.join("fitness.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::new(PathBuf::from("test.db"));
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.analytics_window_days, DEFAULT_WINDOW_DAYS);

        let config = config.with_environment(Environment::Production).with_window_days(0);
        assert!(config.environment.is_production());
        assert_eq!(config.analytics_window_days, 1);

        let config = config.with_window_days(u32::MAX);
        assert_eq!(config.analytics_window_days, MAX_WINDOW_DAYS);
        assert_eq!(config.with_window_days(MAX_WINDOW_DAYS).analytics_window_days, 365);
    }

    #[test]
    fn test_environment_parses_from_cli_value() {
        assert_eq!(Environment::from_str("production", true).unwrap(), Environment::Production);
        assert!(Environment::from_str("staging", true).is_err());
    }
}
