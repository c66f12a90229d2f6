/// Habit entity and the activity predicate
///
/// This module defines the core Habit struct along with its validation rules
/// and the single activity predicate every analytics path consults. The
/// predicate composes the three state axes from `types`; nothing else in the
/// crate re-derives any of its rules.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use crate::domain::{DomainError, HabitId, Lifecycle, PauseState, Schedule, TemporarySpan};

/// A habit represents something the user wants to do regularly
///
/// Identity (`id`) and `created_at` are immutable; everything else changes
/// through update commands. The color tag is opaque display metadata carried
/// through for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier for this habit
    pub id: HabitId,
    /// Display name (e.g., "Morning Run", "Read for 30min")
    pub name: String,
    /// Optional detailed description
    pub description: Option<String>,
    /// Optional display color tag, opaque to the core
    pub color: Option<String>,
    /// Which days of the week this habit applies to
    pub schedule: Schedule,
    /// Ongoing, time-boxed, or soft-deleted
    pub lifecycle: Lifecycle,
    /// Temporary exclusion window, if any
    pub pause: PauseState,
    /// When this habit was created
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// Create a new habit with validation
    ///
    /// `span` time-boxes the habit: a duration in days is anchored at today
    /// (a 1-day habit ends the day it starts), an explicit end date is used
    /// as-is but may not precede today.
    pub fn new(
        name: String,
        description: Option<String>,
        color: Option<String>,
        schedule: Schedule,
        span: Option<TemporarySpan>,
    ) -> Result<Self, DomainError> {
        Self::validate_name(&name)?;
        Self::validate_description(&description)?;
        Self::validate_color(&color)?;
        schedule.validate()?;

        let created_at = Utc::now();
        let lifecycle = match span {
            None => Lifecycle::Normal,
            Some(span) => {
                let ends_on = Self::derive_end_date(span, created_at.date_naive())?;
                Lifecycle::Temporary { ends_on }
            }
        };

        Ok(Self {
            id: HabitId::new(),
            name,
            description,
            color,
            schedule,
            lifecycle,
            pause: PauseState::Running,
            created_at,
        })
    }

    /// Create a habit from existing data (used when loading from the record
    /// store)
    pub fn from_existing(
        id: HabitId,
        name: String,
        description: Option<String>,
        color: Option<String>,
        schedule: Schedule,
        lifecycle: Lifecycle,
        pause: PauseState,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            description,
            color,
            schedule,
            lifecycle,
            pause,
            created_at,
        }
    }

    /// Decide whether this habit counts on the given date
    ///
    /// Rule order: soft-deleted habits are inactive everywhere; a time-boxed
    /// habit is inactive strictly after its end date; a paused habit is
    /// inactive through its pause date; otherwise the schedule decides.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        if self.lifecycle.is_deleted() {
            return false;
        }
        if self.lifecycle.expired_by(date) {
            return false;
        }
        if self.pause.covers(date) {
            return false;
        }
        self.schedule.applies_on(date)
    }

    /// Convenience accessor for soft-delete state
    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    /// True while a pause is recorded, regardless of whether it has lapsed
    pub fn is_paused(&self) -> bool {
        matches!(self.pause, PauseState::Paused { .. })
    }

    /// Apply a partial update with validation
    ///
    /// Validation runs against the incoming values before anything is
    /// written, so a failed update leaves the habit untouched.
    pub fn apply(&mut self, patch: HabitPatch) -> Result<(), DomainError> {
        if let Some(ref new_name) = patch.name {
            Self::validate_name(new_name)?;
        }
        if let Some(ref new_description) = patch.description {
            Self::validate_description(new_description)?;
        }
        if let Some(ref new_color) = patch.color {
            Self::validate_color(new_color)?;
        }
        if let Some(ref new_schedule) = patch.schedule {
            new_schedule.validate()?;
        }

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(schedule) = patch.schedule {
            self.schedule = schedule;
        }
        if let Some(ends_on) = patch.ends_on {
            self.lifecycle = match ends_on {
                Some(date) => Lifecycle::Temporary { ends_on: date },
                None => Lifecycle::Normal,
            };
        }

        Ok(())
    }

    /// Resolve a temporary span to its inclusive end date
    fn derive_end_date(span: TemporarySpan, start: NaiveDate) -> Result<NaiveDate, DomainError> {
        match span {
            TemporarySpan::Days(days) => {
                if days == 0 {
                    return Err(DomainError::InvalidDate(
                        "A temporary habit must run for at least 1 day".to_string(),
                    ));
                }
                Ok(start + Duration::days(days as i64 - 1))
            }
            TemporarySpan::Until(date) => {
                if date < start {
                    return Err(DomainError::InvalidDate(
                        "A temporary habit cannot end before it starts".to_string(),
                    ));
                }
                Ok(date)
            }
        }
    }

    // Validation helper methods

    /// Validate habit name according to business rules
    fn validate_name(name: &str) -> Result<(), DomainError> {
        let trimmed = name.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be empty".to_string(),
            ));
        }

        if trimmed.len() > 100 {
            return Err(DomainError::InvalidHabitName(
                "Habit name cannot be longer than 100 characters".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate optional description
    fn validate_description(description: &Option<String>) -> Result<(), DomainError> {
        if let Some(desc) = description {
            if desc.len() > 500 {
                return Err(DomainError::Validation {
                    message: "Description cannot be longer than 500 characters".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validate the optional color tag
    fn validate_color(color: &Option<String>) -> Result<(), DomainError> {
        if let Some(tag) = color {
            let trimmed = tag.trim();
            if trimmed.is_empty() {
                return Err(DomainError::Validation {
                    message: "Color tag cannot be empty if specified".to_string(),
                });
            }
            if trimmed.len() > 32 {
                return Err(DomainError::Validation {
                    message: "Color tag cannot be longer than 32 characters".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// A partial update to a habit
///
/// Outer `Option` = "change this field at all"; inner `Option` = the new
/// value, where `None` clears it. `ends_on: Some(None)` turns a temporary
/// habit back into an open-ended one.
#[derive(Debug, Clone, Default)]
pub struct HabitPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub schedule: Option<Schedule>,
    pub ends_on: Option<Option<NaiveDate>>,
}
