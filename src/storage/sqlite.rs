/// SQLite implementation of the storage traits
///
/// Dates and timestamps go through rusqlite's chrono support; frequency,
/// goal and exercise lists are stored as JSON columns.

use std::collections::BTreeSet;
use std::path::PathBuf;

use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;

use crate::analytics::exercise_key;
use crate::domain::{
    Category, CompletionId, Habit, HabitCompletion, HabitId, User, UserId, Workout, WorkoutId,
    WorkoutStatus,
};
use crate::storage::{
    migrations, HabitStorage, LibraryExercise, StorageError, UserStorage, WorkoutStorage,
};

const USER_COLUMNS: &str = "id, username, display_name, email, weight_unit, created_at, updated_at";

const HABIT_COLUMNS: &str =
    "id, user_id, name, description, category, frequency, goal, start_date, created_at, is_active";

const COMPLETION_COLUMNS: &str = "id, habit_id, completed_on, completed, value, notes, logged_at";

const WORKOUT_COLUMNS: &str = "id, user_id, name, workout_date, status, started_at, ended_at, \
     active_since, duration_seconds, exercises, notes, created_at";

/// SQLite-based storage implementation
///
/// Holds a single connection; the server processes one request at a time.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Open (or create) the database file and bring the schema up to date
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        let storage = Self::with_connection(conn)?;

        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// A private in-memory database, used by tests
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;
        Ok(Self { conn })
    }

    /// Cheap round trip used by the health check
    pub fn ping(&self) -> Result<(), StorageError> {
        self.conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, column: usize) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(column, e))
}

fn user_id_column(row: &Row<'_>, column: usize) -> rusqlite::Result<UserId> {
    let text: String = row.get(column)?;
    UserId::from_string(&text).map_err(|e| conversion_error(column, e))
}

fn habit_id_column(row: &Row<'_>, column: usize) -> rusqlite::Result<HabitId> {
    let text: String = row.get(column)?;
    HabitId::from_string(&text).map_err(|e| conversion_error(column, e))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: user_id_column(row, 0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        email: row.get(3)?,
        weight_unit: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let category: String = row.get(4)?;

    Ok(Habit {
        id: habit_id_column(row, 0)?,
        user_id: user_id_column(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        category: category.parse::<Category>().map_err(|e| conversion_error(4, e))?,
        frequency: json_column(row, 5)?,
        goal: json_column(row, 6)?,
        start_date: row.get(7)?,
        created_at: row.get(8)?,
        is_active: row.get(9)?,
    })
}

fn completion_from_row(row: &Row<'_>) -> rusqlite::Result<HabitCompletion> {
    let id: String = row.get(0)?;

    Ok(HabitCompletion {
        id: CompletionId::from_string(&id).map_err(|e| conversion_error(0, e))?,
        habit_id: habit_id_column(row, 1)?,
        date: row.get(2)?,
        completed: row.get(3)?,
        value: row.get(4)?,
        notes: row.get(5)?,
        logged_at: row.get(6)?,
    })
}

fn workout_from_row(row: &Row<'_>) -> rusqlite::Result<Workout> {
    let id: String = row.get(0)?;
    let status: String = row.get(4)?;

    Ok(Workout {
        id: WorkoutId::from_string(&id).map_err(|e| conversion_error(0, e))?,
        user_id: user_id_column(row, 1)?,
        name: row.get(2)?,
        date: row.get(3)?,
        status: status.parse::<WorkoutStatus>().map_err(|e| conversion_error(4, e))?,
        started_at: row.get(5)?,
        ended_at: row.get(6)?,
        active_since: row.get(7)?,
        duration_seconds: row.get(8)?,
        exercises: json_column(row, 9)?,
        notes: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn insert_workout(conn: &Connection, workout: &Workout) -> Result<(), StorageError> {
    let exercises_json = serde_json::to_string(&workout.exercises)?;

    conn.execute(
        &format!(
            "INSERT INTO workouts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            WORKOUT_COLUMNS
        ),
        params![
            workout.id.to_string(),
            workout.user_id.to_string(),
            workout.name,
            workout.date,
            workout.status.as_str(),
            workout.started_at,
            workout.ended_at,
            workout.active_since,
            workout.duration_seconds,
            exercises_json,
            workout.notes,
            workout.created_at
        ],
    )?;
    Ok(())
}

/// Returns the number of rows changed (0 when the workout doesn't exist)
fn update_workout_row(conn: &Connection, workout: &Workout) -> Result<usize, StorageError> {
    let exercises_json = serde_json::to_string(&workout.exercises)?;

    let rows_affected = conn.execute(
        "UPDATE workouts SET
            name = ?2,
            workout_date = ?3,
            status = ?4,
            started_at = ?5,
            ended_at = ?6,
            active_since = ?7,
            duration_seconds = ?8,
            exercises = ?9,
            notes = ?10
         WHERE id = ?1",
        params![
            workout.id.to_string(),
            workout.name,
            workout.date,
            workout.status.as_str(),
            workout.started_at,
            workout.ended_at,
            workout.active_since,
            workout.duration_seconds,
            exercises_json,
            workout.notes
        ],
    )?;
    Ok(rows_affected)
}

impl UserStorage for SqliteStorage {
    fn create_user(&self, user: &User) -> Result<(), StorageError> {
        let result = self.conn.execute(
            &format!("INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)", USER_COLUMNS),
            params![
                user.id.to_string(),
                user.username,
                user.display_name,
                user.email,
                user.weight_unit,
                user.created_at,
                user.updated_at
            ],
        );

        match result {
            Ok(_) => {
                tracing::debug!("Created user: {} ({})", user.username, user.id);
                Ok(())
            }
            Err(e) if is_constraint_violation(&e) => Err(StorageError::DuplicateUsername {
                username: user.username.clone(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    fn get_user(&self, user_id: &UserId) -> Result<User, StorageError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
                params![user_id.to_string()],
                user_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::UserNotFound {
                user_id: user_id.to_string(),
            })
    }

    fn update_user(&self, user: &User) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET display_name = ?2, email = ?3, weight_unit = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                user.id.to_string(),
                user.display_name,
                user.email,
                user.weight_unit,
                user.updated_at
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::UserNotFound {
                user_id: user.id.to_string(),
            });
        }
        Ok(())
    }
}

impl HabitStorage for SqliteStorage {
    fn create_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let frequency_json = serde_json::to_string(&habit.frequency)?;
        let goal_json = serde_json::to_string(&habit.goal)?;

        self.conn.execute(
            &format!(
                "INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                HABIT_COLUMNS
            ),
            params![
                habit.id.to_string(),
                habit.user_id.to_string(),
                habit.name,
                habit.description,
                habit.category.as_key(),
                frequency_json,
                goal_json,
                habit.start_date,
                habit.created_at,
                habit.is_active
            ],
        )?;

        tracing::debug!("Created habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn get_habit(&self, habit_id: &HabitId) -> Result<Habit, StorageError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM habits WHERE id = ?1", HABIT_COLUMNS),
                params![habit_id.to_string()],
                habit_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            })
    }

    fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let frequency_json = serde_json::to_string(&habit.frequency)?;
        let goal_json = serde_json::to_string(&habit.goal)?;

        let rows_affected = self.conn.execute(
            "UPDATE habits SET
                name = ?2,
                description = ?3,
                category = ?4,
                frequency = ?5,
                goal = ?6,
                is_active = ?7
             WHERE id = ?1",
            params![
                habit.id.to_string(),
                habit.name,
                habit.description,
                habit.category.as_key(),
                frequency_json,
                goal_json,
                habit.is_active
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit.id.to_string(),
            });
        }

        tracing::debug!("Updated habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM habit_completions WHERE habit_id = ?1",
            params![habit_id.to_string()],
        )?;
        let rows_affected = tx.execute("DELETE FROM habits WHERE id = ?1", params![habit_id.to_string()])?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: habit_id.to_string(),
            });
        }
        tx.commit()?;

        tracing::debug!("Deleted habit: {}", habit_id);
        Ok(())
    }

    fn list_habits(
        &self,
        user_id: &UserId,
        category: Option<&Category>,
        active_only: bool,
    ) -> Result<Vec<Habit>, StorageError> {
        let mut sql = format!("SELECT {} FROM habits WHERE user_id = ?1", HABIT_COLUMNS);
        let mut values = vec![user_id.to_string()];

        if let Some(category) = category {
            values.push(category.as_key());
            sql.push_str(&format!(" AND category = ?{}", values.len()));
        }
        if active_only {
            sql.push_str(" AND is_active = 1");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let habits = stmt
            .query_map(params_from_iter(values.iter()), habit_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(habits)
    }

    fn upsert_completion(&self, completion: &HabitCompletion) -> Result<HabitCompletion, StorageError> {
        self.conn.execute(
            &format!(
                "INSERT INTO habit_completions ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT (habit_id, completed_on) DO UPDATE SET
                    completed = excluded.completed,
                    value = excluded.value,
                    notes = excluded.notes,
                    logged_at = excluded.logged_at",
                COMPLETION_COLUMNS
            ),
            params![
                completion.id.to_string(),
                completion.habit_id.to_string(),
                completion.date,
                completion.completed,
                completion.value,
                completion.notes,
                completion.logged_at
            ],
        )?;

        tracing::debug!(
            "Stored completion for habit {} on {} (completed: {})",
            completion.habit_id,
            completion.date,
            completion.completed
        );

        self.get_completion(&completion.habit_id, completion.date)?
            .ok_or_else(|| StorageError::HabitNotFound {
                habit_id: completion.habit_id.to_string(),
            })
    }

    fn get_completion(&self, habit_id: &HabitId, date: NaiveDate) -> Result<Option<HabitCompletion>, StorageError> {
        let completion = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM habit_completions WHERE habit_id = ?1 AND completed_on = ?2",
                    COMPLETION_COLUMNS
                ),
                params![habit_id.to_string(), date],
                completion_from_row,
            )
            .optional()?;
        Ok(completion)
    }

    fn get_completions(&self, habit_id: &HabitId) -> Result<Vec<HabitCompletion>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM habit_completions WHERE habit_id = ?1 ORDER BY completed_on ASC",
            COMPLETION_COLUMNS
        ))?;
        let completions = stmt
            .query_map(params![habit_id.to_string()], completion_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(completions)
    }
}

impl WorkoutStorage for SqliteStorage {
    fn create_workout(&self, workout: &Workout) -> Result<(), StorageError> {
        insert_workout(&self.conn, workout)?;
        tracing::debug!("Created workout: {} ({}, {})", workout.name, workout.id, workout.status);
        Ok(())
    }

    fn save_in_progress_workout(&self, workout: &Workout) -> Result<(), StorageError> {
        let tx = self.conn.unchecked_transaction()?;

        let other: Option<String> = tx
            .query_row(
                "SELECT id FROM workouts
                 WHERE user_id = ?1 AND status IN ('active', 'paused') AND id != ?2
                 LIMIT 1",
                params![workout.user_id.to_string(), workout.id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(workout_id) = other {
            return Err(StorageError::ActiveWorkoutExists { workout_id });
        }

        if update_workout_row(&tx, workout)? == 0 {
            insert_workout(&tx, workout)?;
        }
        tx.commit()?;

        tracing::debug!("Saved in-progress workout: {} ({})", workout.id, workout.status);
        Ok(())
    }

    fn get_workout(&self, workout_id: &WorkoutId) -> Result<Workout, StorageError> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM workouts WHERE id = ?1", WORKOUT_COLUMNS),
                params![workout_id.to_string()],
                workout_from_row,
            )
            .optional()?
            .ok_or_else(|| StorageError::WorkoutNotFound {
                workout_id: workout_id.to_string(),
            })
    }

    fn update_workout(&self, workout: &Workout) -> Result<(), StorageError> {
        if update_workout_row(&self.conn, workout)? == 0 {
            return Err(StorageError::WorkoutNotFound {
                workout_id: workout.id.to_string(),
            });
        }

        tracing::debug!("Updated workout: {} ({})", workout.id, workout.status);
        Ok(())
    }

    fn delete_workout(&self, workout_id: &WorkoutId) -> Result<(), StorageError> {
        let rows_affected = self.conn.execute(
            "DELETE FROM workouts WHERE id = ?1",
            params![workout_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::WorkoutNotFound {
                workout_id: workout_id.to_string(),
            });
        }

        tracing::debug!("Deleted workout: {}", workout_id);
        Ok(())
    }

    fn list_workouts(
        &self,
        user_id: &UserId,
        status: Option<WorkoutStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<Workout>, StorageError> {
        let mut sql = format!("SELECT {} FROM workouts WHERE user_id = ?1", WORKOUT_COLUMNS);
        let mut values = vec![user_id.to_string()];

        if let Some(status) = status {
            values.push(status.as_str().to_string());
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        sql.push_str(" ORDER BY workout_date DESC, created_at DESC");
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let workouts = stmt
            .query_map(params_from_iter(values.iter()), workout_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(workouts)
    }

    fn find_in_progress_workout(&self, user_id: &UserId) -> Result<Option<Workout>, StorageError> {
        let workout = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM workouts
                     WHERE user_id = ?1 AND status IN ('active', 'paused')
                     ORDER BY created_at DESC LIMIT 1",
                    WORKOUT_COLUMNS
                ),
                params![user_id.to_string()],
                workout_from_row,
            )
            .optional()?;
        Ok(workout)
    }

    fn record_exercise_usage(&self, workout: &Workout) -> Result<(), StorageError> {
        let now = Utc::now();
        let mut seen = BTreeSet::new();

        let tx = self.conn.unchecked_transaction()?;
        for exercise in &workout.exercises {
            let key = exercise_key(&exercise.name);
            if !seen.insert(key.clone()) {
                continue;
            }
            tx.execute(
                "INSERT INTO exercise_library (user_id, name, name_key, muscle_group, equipment, usage_count, last_used_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)
                 ON CONFLICT (user_id, name_key) DO UPDATE SET
                    usage_count = exercise_library.usage_count + 1,
                    muscle_group = COALESCE(excluded.muscle_group, exercise_library.muscle_group),
                    equipment = COALESCE(excluded.equipment, exercise_library.equipment),
                    last_used_at = excluded.last_used_at",
                params![
                    workout.user_id.to_string(),
                    exercise.name.trim(),
                    key,
                    exercise.muscle_group,
                    exercise.equipment,
                    now
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn search_exercise_library(
        &self,
        user_id: &UserId,
        query: Option<&str>,
        muscle_group: Option<&str>,
        limit: u32,
    ) -> Result<Vec<LibraryExercise>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, muscle_group, equipment, usage_count FROM exercise_library
             WHERE user_id = ?1
               AND (?2 IS NULL OR name_key LIKE ?2 ESCAPE '\\')
               AND (?3 IS NULL OR muscle_group = ?3)
             ORDER BY usage_count DESC, last_used_at DESC, name ASC
             LIMIT ?4",
        )?;

        let pattern = query.map(|q| format!("%{}%", escape_like(&exercise_key(q))));
        let entries = stmt
            .query_map(params![user_id.to_string(), pattern, muscle_group, limit], |row| {
                Ok(LibraryExercise {
                    name: row.get(0)?,
                    muscle_group: row.get(1)?,
                    equipment: row.get(2)?,
                    usage_count: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Escape LIKE wildcards so a search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
