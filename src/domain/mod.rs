/// Domain module containing core business logic and data types
///
/// This module defines the core entities (Habit, Completion), the tagged
/// state types they are built from, and their validation rules.

pub mod habit;
pub mod completion;
pub mod types;

// Re-export public types for easy access
pub use habit::*;
pub use completion::*;
pub use types::*;

use thiserror::Error;

/// Errors that can occur during domain operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid habit name: {0}")]
    InvalidHabitName(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
