/// Completion record for a habit on a calendar date
///
/// A completion says "this habit was done on this day" and nothing more. At
/// most one completion exists per (habit, date) pair; the state store's
/// toggle command enforces that, and the record store backs it with a unique
/// index. Completions are created and removed whole, never edited.

use serde::{Deserialize, Serialize};
use chrono::NaiveDate;
use crate::domain::{CompletionId, HabitId};

/// A record that a given habit was done on a given date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Unique identifier for this record
    pub id: CompletionId,
    /// Which habit was completed
    pub habit_id: HabitId,
    /// Which calendar day it was completed on (no time component)
    pub date: NaiveDate,
}

impl Completion {
    /// Create a new completion record
    pub fn new(habit_id: HabitId, date: NaiveDate) -> Self {
        Self {
            id: CompletionId::new(),
            habit_id,
            date,
        }
    }

    /// Create a completion from existing data (used when loading from the
    /// record store)
    pub fn from_existing(id: CompletionId, habit_id: HabitId, date: NaiveDate) -> Self {
        Self { id, habit_id, date }
    }
}
