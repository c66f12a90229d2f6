/// Core identifier and state types used throughout the domain layer
///
/// This module defines the id newtypes plus the three independent state axes
/// of a habit: its Schedule (which days it applies to), its Lifecycle
/// (normal, time-boxed, or soft-deleted), and its PauseState. The activity
/// predicate on Habit composes these; each axis only answers for itself.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use uuid::Uuid;

/// Unique identifier for a habit
///
/// This is a wrapper around UUID to provide type safety - you can't
/// accidentally pass a habit ID where a completion ID is expected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HabitId(pub Uuid);

impl HabitId {
    /// Generate a new random habit ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a habit ID from a string (useful for database loading)
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for HabitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a completion record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionId(pub Uuid);

impl CompletionId {
    /// Generate a new random completion ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a completion ID from a string
    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl std::fmt::Display for CompletionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which calendar days a habit applies to
///
/// A habit with no day restriction is expected every day. Day-restricted
/// habits only count on the listed weekdays; all other days are neutral for
/// streaks and statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Schedule {
    /// Expected every single day
    EveryDay,
    /// Expected only on the listed weekdays (e.g. Monday, Wednesday, Friday)
    DaysOfWeek(Vec<Weekday>),
}

impl Schedule {
    /// Validate that a schedule is well-formed
    pub fn validate(&self) -> Result<(), crate::domain::DomainError> {
        if let Schedule::DaysOfWeek(days) = self {
            if days.len() > 7 {
                return Err(crate::domain::DomainError::InvalidSchedule(
                    "A weekly schedule cannot list more than 7 days".to_string(),
                ));
            }
            for (i, day) in days.iter().enumerate() {
                if days[..i].contains(day) {
                    return Err(crate::domain::DomainError::InvalidSchedule(
                        format!("Duplicate day in schedule: {}", day),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Check whether this schedule expects the habit on the given date
    ///
    /// An empty day list behaves like EveryDay: no restriction.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        match self {
            Schedule::EveryDay => true,
            Schedule::DaysOfWeek(days) if days.is_empty() => true,
            Schedule::DaysOfWeek(days) => days.contains(&date.weekday()),
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule::EveryDay
    }
}

/// Whether a habit is ongoing, time-boxed, or soft-deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Ordinary open-ended habit
    Normal,
    /// Habit that stops counting strictly after its end date
    Temporary { ends_on: NaiveDate },
    /// Soft-deleted habit; completions are retained until a permanent delete
    Deleted { deleted_at: DateTime<Utc> },
}

impl Lifecycle {
    /// True once a temporary habit's window has closed (the end date itself
    /// still counts)
    pub fn expired_by(&self, date: NaiveDate) -> bool {
        matches!(self, Lifecycle::Temporary { ends_on } if date > *ends_on)
    }

    /// True for soft-deleted habits
    pub fn is_deleted(&self) -> bool {
        matches!(self, Lifecycle::Deleted { .. })
    }
}

/// How the end date of a time-boxed habit is supplied at creation time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemporarySpan {
    /// Run for a fixed number of days starting from the creation date
    Days(u32),
    /// Run until the given date, inclusive
    Until(NaiveDate),
}

/// Whether a habit is temporarily excluded from activity
///
/// A pause covers dates up to and including its `until` date, then lapses on
/// its own; an explicit unpause just clears it early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PauseState {
    /// Not paused
    Running,
    /// Paused through the given date, inclusive
    Paused { until: NaiveDate },
}

impl PauseState {
    /// Check whether the pause excludes the given date
    pub fn covers(&self, date: NaiveDate) -> bool {
        matches!(self, PauseState::Paused { until } if date <= *until)
    }
}

impl Default for PauseState {
    fn default() -> Self {
        PauseState::Running
    }
}
