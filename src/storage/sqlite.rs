/// SQLite implementation of the record store
///
/// Habits keep their enum-shaped fields (schedule, lifecycle, pause state) as
/// JSON columns, so the schema doesn't need to change when a variant grows a
/// field. The connection sits behind a mutex: rusqlite is synchronous and the
/// async trait methods simply run their statements inline.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

use crate::domain::{Completion, CompletionId, Habit, HabitId};
use crate::storage::{migrations, RecordStore, StorageError};

/// SQLite-backed record store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path and migrate it
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        Self::initialize(conn, Some(&db_path))
    }

    /// Open an in-memory database (used by tests)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        Self::initialize(conn, None)
    }

    fn initialize(conn: Connection, db_path: Option<&PathBuf>) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", []).map_err(|e| {
            StorageError::Connection(format!("Failed to enable foreign keys: {}", e))
        })?;

        migrations::initialize_database(&conn)?;

        if let Some(path) = db_path {
            tracing::info!("SQLite record store initialized at: {:?}", path);
        }

        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Connection("Database mutex poisoned".to_string()))
    }

    /// Build a rusqlite column error (used when decoding stored JSON/UUIDs)
    fn column_error(index: usize, message: &str) -> rusqlite::Error {
        rusqlite::Error::InvalidColumnType(index, message.to_string(), rusqlite::types::Type::Text)
    }

    /// Map a habits row to the domain entity
    fn habit_from_row(row: &Row<'_>) -> Result<Habit, rusqlite::Error> {
        let id_str: String = row.get(0)?;
        let id = HabitId::from_string(&id_str)
            .map_err(|_| Self::column_error(0, "Invalid UUID"))?;

        let schedule_json: String = row.get(4)?;
        let schedule = serde_json::from_str(&schedule_json)
            .map_err(|_| Self::column_error(4, "Invalid schedule"))?;

        let lifecycle_json: String = row.get(5)?;
        let lifecycle = serde_json::from_str(&lifecycle_json)
            .map_err(|_| Self::column_error(5, "Invalid lifecycle"))?;

        let pause_json: String = row.get(6)?;
        let pause = serde_json::from_str(&pause_json)
            .map_err(|_| Self::column_error(6, "Invalid pause state"))?;

        let created_at_str: String = row.get(7)?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map_err(|_| Self::column_error(7, "Invalid datetime"))?
            .with_timezone(&chrono::Utc);

        Ok(Habit::from_existing(
            id,
            row.get(1)?, // name
            row.get(2)?, // description
            row.get(3)?, // color
            schedule,
            lifecycle,
            pause,
            created_at,
        ))
    }

    /// Map a completions row to the domain entity
    fn completion_from_row(row: &Row<'_>) -> Result<Completion, rusqlite::Error> {
        let id_str: String = row.get(0)?;
        let id = CompletionId::from_string(&id_str)
            .map_err(|_| Self::column_error(0, "Invalid UUID"))?;

        let habit_id_str: String = row.get(1)?;
        let habit_id = HabitId::from_string(&habit_id_str)
            .map_err(|_| Self::column_error(1, "Invalid UUID"))?;

        let date_str: String = row.get(2)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|_| Self::column_error(2, "Invalid date"))?;

        Ok(Completion::from_existing(id, habit_id, date))
    }

    fn insert_habit(conn: &Connection, habit: &Habit) -> Result<(), StorageError> {
        let schedule_json = serde_json::to_string(&habit.schedule)?;
        let lifecycle_json = serde_json::to_string(&habit.lifecycle)?;
        let pause_json = serde_json::to_string(&habit.pause)?;

        conn.execute(
            "INSERT INTO habits (
                id, name, description, color, schedule, lifecycle, pause_state, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                habit.id.to_string(),
                habit.name,
                habit.description,
                habit.color,
                schedule_json,
                lifecycle_json,
                pause_json,
                habit.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn insert_completion(conn: &Connection, completion: &Completion) -> Result<(), StorageError> {
        conn.execute(
            "INSERT INTO completions (id, habit_id, date) VALUES (?1, ?2, ?3)",
            params![
                completion.id.to_string(),
                completion.habit_id.to_string(),
                completion.date.to_string(),
            ],
        )?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn add_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let conn = self.lock()?;
        Self::insert_habit(&conn, habit)?;

        tracing::debug!("Stored habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    async fn update_habit(&self, habit: &Habit) -> Result<(), StorageError> {
        let schedule_json = serde_json::to_string(&habit.schedule)?;
        let lifecycle_json = serde_json::to_string(&habit.lifecycle)?;
        let pause_json = serde_json::to_string(&habit.pause)?;

        let conn = self.lock()?;
        let rows_affected = conn.execute(
            "UPDATE habits SET
                name = ?2,
                description = ?3,
                color = ?4,
                schedule = ?5,
                lifecycle = ?6,
                pause_state = ?7
             WHERE id = ?1",
            params![
                habit.id.to_string(),
                habit.name,
                habit.description,
                habit.color,
                schedule_json,
                lifecycle_json,
                pause_json,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id: habit.id.to_string() });
        }

        tracing::debug!("Updated habit: {} ({})", habit.name, habit.id);
        Ok(())
    }

    async fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM completions WHERE habit_id = ?1",
            params![habit_id.to_string()],
        )?;
        let rows_affected =
            tx.execute("DELETE FROM habits WHERE id = ?1", params![habit_id.to_string()])?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound { habit_id: habit_id.to_string() });
        }

        tx.commit()?;
        tracing::debug!("Permanently deleted habit: {}", habit_id);
        Ok(())
    }

    async fn all_habits(&self) -> Result<Vec<Habit>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, color, schedule, lifecycle, pause_state, created_at
             FROM habits ORDER BY created_at ASC",
        )?;

        let habit_iter = stmt.query_map([], |row| Self::habit_from_row(row))?;

        let mut habits = Vec::new();
        for habit in habit_iter {
            habits.push(habit?);
        }

        Ok(habits)
    }

    async fn add_completion(
        &self,
        completion: &Completion,
    ) -> Result<CompletionId, StorageError> {
        let conn = self.lock()?;

        let existing: Result<String, rusqlite::Error> = conn.query_row(
            "SELECT id FROM completions WHERE habit_id = ?1 AND date = ?2",
            params![completion.habit_id.to_string(), completion.date.to_string()],
            |row| row.get(0),
        );

        match existing {
            Ok(id_str) => {
                let id = CompletionId::from_string(&id_str).map_err(|_| {
                    StorageError::Corrupt(format!("completion id is not a UUID: {}", id_str))
                })?;
                tracing::debug!(
                    "Completion already recorded for habit {} on {}",
                    completion.habit_id,
                    completion.date
                );
                Ok(id)
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                Self::insert_completion(&conn, completion)?;
                tracing::debug!(
                    "Stored completion for habit {} on {}",
                    completion.habit_id,
                    completion.date
                );
                Ok(completion.id.clone())
            }
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    async fn delete_completion(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
    ) -> Result<(), StorageError> {
        let conn = self.lock()?;
        let rows_affected = conn.execute(
            "DELETE FROM completions WHERE habit_id = ?1 AND date = ?2",
            params![habit_id.to_string(), date.to_string()],
        )?;

        if rows_affected == 0 {
            tracing::debug!("No completion to delete for habit {} on {}", habit_id, date);
        }
        Ok(())
    }

    async fn all_completions(&self) -> Result<Vec<Completion>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, date FROM completions ORDER BY date ASC",
        )?;

        let completion_iter = stmt.query_map([], |row| Self::completion_from_row(row))?;

        let mut completions = Vec::new();
        for completion in completion_iter {
            completions.push(completion?);
        }

        Ok(completions)
    }

    async fn replace_all(
        &self,
        habits: &[Habit],
        completions: &[Completion],
    ) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM completions", [])?;
        tx.execute("DELETE FROM habits", [])?;

        for habit in habits {
            Self::insert_habit(&tx, habit)?;
        }
        for completion in completions {
            Self::insert_completion(&tx, completion)?;
        }

        tx.commit()?;
        tracing::info!(
            "Replaced store contents: {} habits, {} completions",
            habits.len(),
            completions.len()
        );
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), StorageError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM completions", [])?;
        tx.execute("DELETE FROM habits", [])?;

        tx.commit()?;
        tracing::info!("Deleted all store contents");
        Ok(())
    }
}
