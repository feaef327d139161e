/// Database migration management
///
/// This module creates and updates the SQLite schema. Each migration runs
/// once and the applied version is tracked in `schema_version`.

use rusqlite::Connection;
use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
pub const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// Creates all required tables and indexes if they don't exist.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let current_version = get_current_version(conn)?;

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    } else if current_version > CURRENT_VERSION {
        return Err(StorageError::Migration(format!(
            "Database schema version {} is newer than supported version {}",
            current_version, CURRENT_VERSION
        )));
    }

    Ok(())
}

/// Get the current database schema version (0 for a fresh database)
pub fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i32>>(0)
    })?;

    Ok(version.unwrap_or(0))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    Ok(())
}

/// Migration to version 1: users, habits with daily completions, workouts
/// and the per-user exercise library
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            display_name TEXT NOT NULL,
            email TEXT,
            weight_unit TEXT NOT NULL DEFAULT 'kg',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habits (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            description TEXT,
            category TEXT NOT NULL,
            frequency TEXT NOT NULL,
            goal TEXT NOT NULL,
            start_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS habit_completions (
            id TEXT PRIMARY KEY,
            habit_id TEXT NOT NULL,
            completed_on TEXT NOT NULL,
            completed BOOLEAN NOT NULL DEFAULT TRUE,
            value REAL,
            notes TEXT,
            logged_at TEXT NOT NULL,
            UNIQUE (habit_id, completed_on),
            FOREIGN KEY (habit_id) REFERENCES habits (id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS workouts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            workout_date TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at TEXT,
            ended_at TEXT,
            active_since TEXT,
            duration_seconds INTEGER NOT NULL DEFAULT 0,
            exercises TEXT NOT NULL,
            notes TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS exercise_library (
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL,
            muscle_group TEXT,
            equipment TEXT,
            usage_count INTEGER NOT NULL DEFAULT 0,
            last_used_at TEXT NOT NULL,
            PRIMARY KEY (user_id, name_key),
            FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
        );",
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created initial database schema");
    Ok(())
}

fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_habits_user ON habits (user_id, is_active);
        CREATE INDEX IF NOT EXISTS idx_habits_category ON habits (category);
        CREATE INDEX IF NOT EXISTS idx_completions_habit_date ON habit_completions (habit_id, completed_on);
        CREATE INDEX IF NOT EXISTS idx_workouts_user_date ON workouts (user_id, workout_date);
        CREATE INDEX IF NOT EXISTS idx_workouts_user_status ON workouts (user_id, status);",
    )?;

    tracing::debug!("Created database indexes for v1");
    Ok(())
}
