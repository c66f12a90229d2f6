/// Persistent record store for habits and completions
///
/// This module defines the record-store contract the state store persists
/// through, plus the SQLite implementation. The store is a dumb ledger: it
/// never computes analytics, it just keeps the collections durable.

pub mod sqlite;
pub mod migrations;

// Re-export the main storage types
pub use sqlite::*;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use crate::domain::{Completion, CompletionId, Habit, HabitId};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Database query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

/// Contract for the persistent record store
///
/// Mutations are awaited by the state store before it touches its in-memory
/// snapshot, so an implementation that fails must fail before writing
/// anything observable. `replace_all` swaps both collections atomically.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new habit
    async fn add_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Persist the full current state of an existing habit
    async fn update_habit(&self, habit: &Habit) -> Result<(), StorageError>;

    /// Permanently remove a habit and cascade-delete its completions
    async fn delete_habit(&self, habit_id: &HabitId) -> Result<(), StorageError>;

    /// Load every stored habit, soft-deleted ones included
    async fn all_habits(&self) -> Result<Vec<Habit>, StorageError>;

    /// Persist a completion; idempotent, returning the existing record's id
    /// when the (habit, date) pair is already present
    async fn add_completion(&self, completion: &Completion)
        -> Result<CompletionId, StorageError>;

    /// Remove the completion for the given (habit, date) pair, if any
    async fn delete_completion(
        &self,
        habit_id: &HabitId,
        date: NaiveDate,
    ) -> Result<(), StorageError>;

    /// Load every stored completion
    async fn all_completions(&self) -> Result<Vec<Completion>, StorageError>;

    /// Atomically replace both collections (import)
    async fn replace_all(
        &self,
        habits: &[Habit],
        completions: &[Completion],
    ) -> Result<(), StorageError>;

    /// Remove all stored data
    async fn delete_all(&self) -> Result<(), StorageError>;
}
