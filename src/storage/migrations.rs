/// Database migration management
///
/// This module handles creating and updating the SQLite database schema. A
/// stored version newer than this binary understands is treated as a schema
/// conflict: the store is dropped and recreated rather than left unreadable.

use rusqlite::Connection;
use crate::storage::StorageError;

/// Current database schema version
///
/// Increment this when you add new migrations
const CURRENT_VERSION: i32 = 1;

/// Initialize the database schema
///
/// Creates all required tables and indexes if they don't exist and records
/// the schema version for future migrations. Idempotent.
pub fn initialize_database(conn: &Connection) -> Result<(), StorageError> {
    // Create version tracking table first
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let mut current_version = get_current_version(conn)?;

    // A database written by a newer build can't be interpreted; reset it and
    // start over from an empty schema.
    if current_version > CURRENT_VERSION {
        tracing::warn!(
            "Schema version {} is newer than supported version {}; resetting store",
            current_version,
            CURRENT_VERSION
        );
        drop_all_tables(conn)?;
        current_version = 0;
    }

    if current_version < CURRENT_VERSION {
        run_migrations(conn, current_version)?;
        set_version(conn, CURRENT_VERSION)?;
    }

    Ok(())
}

/// Get the current database schema version
fn get_current_version(conn: &Connection) -> Result<i32, StorageError> {
    let version = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get::<_, i32>(0)
        })
        .unwrap_or(0); // Default to version 0 if no version record exists

    Ok(version)
}

/// Set the database schema version
fn set_version(conn: &Connection, version: i32) -> Result<(), StorageError> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Drop every data table so the schema can be rebuilt from scratch
fn drop_all_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute("DROP TABLE IF EXISTS completions", [])?;
    conn.execute("DROP TABLE IF EXISTS habits", [])?;
    conn.execute("DELETE FROM schema_version", [])?;
    Ok(())
}

/// Run database migrations from the current version to the latest
fn run_migrations(conn: &Connection, from_version: i32) -> Result<(), StorageError> {
    if from_version < 1 {
        migration_v1(conn)?;
    }

    // Future migrations would go here:
    // if from_version < 2 {
    //     migration_v2(conn)?;
    // }

    Ok(())
}

/// Migration to version 1: Create initial tables
fn migration_v1(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS habits (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            color TEXT,
            schedule TEXT NOT NULL,
            lifecycle TEXT NOT NULL,
            pause_state TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS completions (
            id TEXT PRIMARY KEY,
            habit_id TEXT NOT NULL,
            date TEXT NOT NULL,
            FOREIGN KEY (habit_id) REFERENCES habits (id) ON DELETE CASCADE
        )",
        [],
    )?;

    create_indexes_v1(conn)?;

    tracing::info!("Applied migration v1: Created initial database schema");
    Ok(())
}

/// Create database indexes for version 1
fn create_indexes_v1(conn: &Connection) -> Result<(), StorageError> {
    // At most one completion per habit per day
    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_completions_habit_date
         ON completions (habit_id, date)",
        [],
    )?;

    // Date-keyed lookups for the daily statistics
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_completions_date
         ON completions (date)",
        [],
    )?;

    Ok(())
}
