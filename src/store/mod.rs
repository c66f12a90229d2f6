/// Authoritative in-memory state store for the running session
///
/// `HabitStore` owns the habit and completion collections and is created
/// exactly once at startup, then passed by reference to the presentation
/// layer; there is no module-level singleton. Mutating commands persist to
/// the record store first and only touch the in-memory snapshot after the
/// write succeeds, so a persistence failure leaves queries seeing the
/// last-committed state. Queries are synchronous pure reads; commands are
/// `async fn(&mut self)`, which lets the borrow checker serialize them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::analytics::{
    correlation, stats, streak, CorrelationStrength, LabelledRate, WeekSplit,
};
use crate::domain::{
    Completion, DomainError, Habit, HabitId, HabitPatch, Lifecycle, PauseState, Schedule,
    TemporarySpan,
};
use crate::storage::{RecordStore, StorageError};

/// Errors surfaced by state store commands
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Habit not found: {habit_id}")]
    HabitNotFound { habit_id: String },

    #[error("Domain validation error: {0}")]
    Domain(#[from] DomainError),

    #[error("Record store error: {0}")]
    Storage(#[from] StorageError),
}

/// The full persisted-state layout; must round-trip losslessly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportBundle {
    pub habits: Vec<Habit>,
    pub completions: Vec<Completion>,
}

/// One reported pairwise correlation, ready for display
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationInsight {
    pub habit_a: HabitId,
    pub habit_b: HabitId,
    pub name_a: String,
    pub name_b: String,
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub sample_days: usize,
}

/// Mean per-day completion percentages over the standard trailing windows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollingRates {
    pub today: u8,
    pub last_week: u8,
    pub last_month: u8,
    pub last_year: u8,
}

/// In-memory state store over a persistent record store
pub struct HabitStore<S: RecordStore> {
    habits: Vec<Habit>,
    completions: Vec<Completion>,
    records: S,
}

impl<S: RecordStore> HabitStore<S> {
    /// Load the committed collections from the record store
    pub async fn load(records: S) -> Result<Self, StoreError> {
        let habits = records.all_habits().await?;
        let completions = records.all_completions().await?;

        tracing::info!(
            "Loaded {} habits and {} completions",
            habits.len(),
            completions.len()
        );

        Ok(Self { habits, completions, records })
    }

    // ----- mutating commands (persist first, then commit to memory) -----

    /// Create a habit and return its id
    pub async fn add_habit(
        &mut self,
        name: String,
        description: Option<String>,
        color: Option<String>,
        schedule: Schedule,
        span: Option<TemporarySpan>,
    ) -> Result<HabitId, StoreError> {
        let habit = Habit::new(name, description, color, schedule, span)?;

        self.records.add_habit(&habit).await?;

        let id = habit.id.clone();
        tracing::debug!("Added habit: {} ({})", habit.name, id);
        self.habits.push(habit);
        Ok(id)
    }

    /// Apply a partial update to a habit
    pub async fn update_habit(
        &mut self,
        habit_id: &HabitId,
        patch: HabitPatch,
    ) -> Result<(), StoreError> {
        let index = self.index_of(habit_id)?;

        let mut updated = self.habits[index].clone();
        updated.apply(patch)?;

        self.records.update_habit(&updated).await?;
        self.habits[index] = updated;
        Ok(())
    }

    /// Soft-delete a habit, keeping its completion history
    pub async fn soft_delete(&mut self, habit_id: &HabitId) -> Result<(), StoreError> {
        let index = self.index_of(habit_id)?;

        let mut updated = self.habits[index].clone();
        updated.lifecycle = Lifecycle::Deleted { deleted_at: Utc::now() };

        self.records.update_habit(&updated).await?;
        tracing::debug!("Soft deleted habit: {}", habit_id);
        self.habits[index] = updated;
        Ok(())
    }

    /// Bring a soft-deleted habit back as an ordinary habit
    pub async fn restore(&mut self, habit_id: &HabitId) -> Result<(), StoreError> {
        let index = self.index_of(habit_id)?;

        let mut updated = self.habits[index].clone();
        if !updated.lifecycle.is_deleted() {
            return Ok(());
        }
        updated.lifecycle = Lifecycle::Normal;

        self.records.update_habit(&updated).await?;
        tracing::debug!("Restored habit: {}", habit_id);
        self.habits[index] = updated;
        Ok(())
    }

    /// Remove a habit for good, cascading its completions
    pub async fn permanent_delete(&mut self, habit_id: &HabitId) -> Result<(), StoreError> {
        let index = self.index_of(habit_id)?;

        self.records.delete_habit(habit_id).await?;

        self.habits.remove(index);
        self.completions.retain(|c| c.habit_id != *habit_id);
        tracing::debug!("Permanently deleted habit: {}", habit_id);
        Ok(())
    }

    /// Pause a habit through the given date, inclusive
    pub async fn pause(&mut self, habit_id: &HabitId, until: NaiveDate) -> Result<(), StoreError> {
        let index = self.index_of(habit_id)?;

        let mut updated = self.habits[index].clone();
        updated.pause = PauseState::Paused { until };

        self.records.update_habit(&updated).await?;
        tracing::debug!("Paused habit {} until {}", habit_id, until);
        self.habits[index] = updated;
        Ok(())
    }

    /// Clear a habit's pause immediately
    pub async fn unpause(&mut self, habit_id: &HabitId) -> Result<(), StoreError> {
        let index = self.index_of(habit_id)?;

        let mut updated = self.habits[index].clone();
        updated.pause = PauseState::Running;

        self.records.update_habit(&updated).await?;
        tracing::debug!("Unpaused habit: {}", habit_id);
        self.habits[index] = updated;
        Ok(())
    }

    /// Toggle the completion for (habit, date)
    ///
    /// Inserts when absent, removes when present - the only way completions
    /// change, which keeps the at-most-one-per-(habit, date) invariant.
    /// Returns whether the date is completed afterwards.
    pub async fn toggle_completion(
        &mut self,
        habit_id: &HabitId,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        self.index_of(habit_id)?;

        let existing = self
            .completions
            .iter()
            .position(|c| c.habit_id == *habit_id && c.date == date);

        match existing {
            Some(index) => {
                self.records.delete_completion(habit_id, date).await?;
                self.completions.remove(index);
                tracing::debug!("Cleared completion for habit {} on {}", habit_id, date);
                Ok(false)
            }
            None => {
                let completion = Completion::new(habit_id.clone(), date);
                let id = self.records.add_completion(&completion).await?;
                self.completions
                    .push(Completion::from_existing(id, habit_id.clone(), date));
                tracing::debug!("Recorded completion for habit {} on {}", habit_id, date);
                Ok(true)
            }
        }
    }

    /// Replace both collections from an export bundle
    pub async fn import_data(&mut self, bundle: ExportBundle) -> Result<(), StoreError> {
        self.records
            .replace_all(&bundle.habits, &bundle.completions)
            .await?;

        self.habits = bundle.habits;
        self.completions = bundle.completions;
        tracing::info!(
            "Imported {} habits and {} completions",
            self.habits.len(),
            self.completions.len()
        );
        Ok(())
    }

    /// Wipe everything, persistent and in-memory
    pub async fn delete_all_data(&mut self) -> Result<(), StoreError> {
        self.records.delete_all().await?;

        self.habits.clear();
        self.completions.clear();
        Ok(())
    }

    // ----- query accessors (pure reads over the snapshot, no I/O) -----

    /// All habits except soft-deleted ones
    pub fn habits(&self) -> Vec<&Habit> {
        self.habits.iter().filter(|h| !h.is_deleted()).collect()
    }

    /// Every habit, soft-deleted ones included
    pub fn all_habits(&self) -> &[Habit] {
        &self.habits
    }

    /// Look up a habit by id, soft-deleted ones included
    pub fn habit(&self, habit_id: &HabitId) -> Result<&Habit, StoreError> {
        self.index_of(habit_id).map(|index| &self.habits[index])
    }

    /// Whether the habit counts on the given date
    pub fn is_active(&self, habit_id: &HabitId, date: NaiveDate) -> Result<bool, StoreError> {
        Ok(self.habit(habit_id)?.is_active_on(date))
    }

    /// Whether a completion is recorded for (habit, date)
    pub fn is_completed(&self, habit_id: &HabitId, date: NaiveDate) -> bool {
        stats::is_done(&self.completions, habit_id, date)
    }

    /// The habit's current streak as of the given date
    pub fn current_streak(
        &self,
        habit_id: &HabitId,
        as_of: NaiveDate,
    ) -> Result<u32, StoreError> {
        let habit = self.habit(habit_id)?;
        let done = self.completion_dates(habit_id);
        Ok(streak::current_streak(habit, &done, as_of))
    }

    /// The habit's longest recorded run of calendar-consecutive completions
    pub fn longest_streak(&self, habit_id: &HabitId) -> Result<u32, StoreError> {
        self.index_of(habit_id)?;
        let done = self.completion_dates(habit_id);
        Ok(streak::longest_streak(&done))
    }

    /// Count of habits active on the date
    pub fn active_habits_count(&self, date: NaiveDate) -> usize {
        stats::active_habits_count(&self.habits, date)
    }

    /// Count of active habits completed on the date
    pub fn completed_count(&self, date: NaiveDate) -> usize {
        stats::completed_count(&self.habits, &self.completions, date)
    }

    /// Percentage of active habits completed on the date
    pub fn completion_rate(&self, date: NaiveDate) -> u8 {
        stats::completion_rate(&self.habits, &self.completions, date)
    }

    /// Days on which every active habit was completed
    pub fn perfect_days_count(&self, today: NaiveDate) -> usize {
        stats::perfect_days_count(&self.habits, &self.completions, today)
    }

    /// Per-weekday average completion percentages for chart display
    pub fn weekday_pattern(&self, today: NaiveDate) -> Vec<LabelledRate> {
        stats::weekday_pattern(&self.habits, &self.completions, today)
    }

    /// Pooled weekend vs weekday completion ratios
    pub fn weekend_weekday_rates(&self, today: NaiveDate) -> WeekSplit {
        stats::weekend_weekday_rates(&self.habits, &self.completions, today)
    }

    /// Completion-rate means over the standard trailing windows
    pub fn rolling_rates(&self, today: NaiveDate) -> RollingRates {
        let rate = |days| stats::window_rate(&self.habits, &self.completions, today, days);
        RollingRates {
            today: rate(1),
            last_week: rate(7),
            last_month: rate(30),
            last_year: rate(365),
        }
    }

    /// Pairwise correlations between habits' completion series
    ///
    /// Applies the engine's caller policies: pairs need at least
    /// `MIN_JOINT_SAMPLE` jointly-active days, coefficients at or below the
    /// signal floor are suppressed, and results come back strongest first.
    pub fn correlation_insights(&self, as_of: NaiveDate) -> Vec<CorrelationInsight> {
        let visible = self.habits();
        let mut insights = Vec::new();

        for (i, a) in visible.iter().enumerate() {
            for b in &visible[i + 1..] {
                let (xs, ys) = correlation::joint_series(
                    a,
                    b,
                    &self.completions,
                    as_of,
                    stats::PATTERN_WINDOW_DAYS,
                );
                if xs.len() < correlation::MIN_JOINT_SAMPLE {
                    continue;
                }

                let coefficient = correlation::pearson(&xs, &ys);
                if coefficient.abs() <= correlation::SIGNAL_FLOOR {
                    continue;
                }

                insights.push(CorrelationInsight {
                    habit_a: a.id.clone(),
                    habit_b: b.id.clone(),
                    name_a: a.name.clone(),
                    name_b: b.name.clone(),
                    coefficient,
                    strength: CorrelationStrength::classify(coefficient),
                    sample_days: xs.len(),
                });
            }
        }

        insights.sort_by(|a, b| {
            b.coefficient
                .abs()
                .partial_cmp(&a.coefficient.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        insights
    }

    /// Snapshot both collections as an export bundle
    pub fn export_data(&self) -> ExportBundle {
        ExportBundle {
            habits: self.habits.clone(),
            completions: self.completions.clone(),
        }
    }

    fn index_of(&self, habit_id: &HabitId) -> Result<usize, StoreError> {
        self.habits
            .iter()
            .position(|h| h.id == *habit_id)
            .ok_or_else(|| StoreError::HabitNotFound { habit_id: habit_id.to_string() })
    }

    fn completion_dates(&self, habit_id: &HabitId) -> BTreeSet<NaiveDate> {
        self.completions
            .iter()
            .filter(|c| c.habit_id == *habit_id)
            .map(|c| c.date)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStore;
    use async_trait::async_trait;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn sqlite_store() -> HabitStore<SqliteStore> {
        HabitStore::load(SqliteStore::open_in_memory().unwrap())
            .await
            .unwrap()
    }

    async fn add_daily(store: &mut HabitStore<SqliteStore>, name: &str) -> HabitId {
        store
            .add_habit(name.to_string(), None, None, Schedule::EveryDay, None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_add_and_list_habits() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;

        assert_eq!(store.habits().len(), 1);
        assert_eq!(store.habit(&id).unwrap().name, "Read");
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_persisting() {
        let mut store = sqlite_store().await;
        let result = store
            .add_habit("  ".to_string(), None, None, Schedule::EveryDay, None)
            .await;

        assert!(matches!(result, Err(StoreError::Domain(_))));
        assert!(store.habits().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_is_an_involution() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;
        let day = date(2026, 8, 5);

        assert!(store.toggle_completion(&id, day).await.unwrap());
        assert!(store.is_completed(&id, day));
        assert!(!store.toggle_completion(&id, day).await.unwrap());
        assert!(!store.is_completed(&id, day));
    }

    #[tokio::test]
    async fn test_at_most_one_completion_per_day() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;
        let day = date(2026, 8, 5);

        for _ in 0..5 {
            store.toggle_completion(&id, day).await.unwrap();
        }

        let count = store
            .export_data()
            .completions
            .iter()
            .filter(|c| c.habit_id == id && c.date == day)
            .count();
        assert!(count <= 1);
    }

    #[tokio::test]
    async fn test_soft_delete_keeps_completions() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;
        store.toggle_completion(&id, date(2026, 8, 5)).await.unwrap();

        store.soft_delete(&id).await.unwrap();

        assert!(store.habits().is_empty());
        assert_eq!(store.export_data().completions.len(), 1);
        assert_eq!(store.active_habits_count(date(2026, 8, 5)), 0);

        store.restore(&id).await.unwrap();
        assert_eq!(store.habits().len(), 1);
        assert_eq!(store.active_habits_count(date(2026, 8, 5)), 1);
    }

    #[tokio::test]
    async fn test_permanent_delete_cascades() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;
        store.toggle_completion(&id, date(2026, 8, 5)).await.unwrap();

        store.permanent_delete(&id).await.unwrap();

        assert!(store.all_habits().is_empty());
        assert!(store.export_data().completions.is_empty());
        assert!(matches!(
            store.habit(&id),
            Err(StoreError::HabitNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_pause_and_unpause() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;
        let today = date(2026, 8, 5);

        store.pause(&id, today + Duration::days(3)).await.unwrap();
        assert!(!store.is_active(&id, today).unwrap());
        assert!(store.is_active(&id, today + Duration::days(4)).unwrap());

        store.unpause(&id).await.unwrap();
        assert!(store.is_active(&id, today).unwrap());
    }

    #[tokio::test]
    async fn test_streak_queries() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;
        let today = date(2026, 8, 5);

        store.toggle_completion(&id, today).await.unwrap();
        store
            .toggle_completion(&id, today - Duration::days(1))
            .await
            .unwrap();

        assert_eq!(store.current_streak(&id, today).unwrap(), 2);
        assert_eq!(store.longest_streak(&id).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_export_import_round_trip() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;
        store.toggle_completion(&id, date(2026, 8, 5)).await.unwrap();

        let bundle = store.export_data();
        let json = serde_json::to_string(&bundle).unwrap();
        let parsed: ExportBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bundle);

        let mut other = sqlite_store().await;
        other.import_data(parsed).await.unwrap();
        assert_eq!(other.export_data(), bundle);

        // The imported state survives a reload from the record store.
        let reloaded = other.export_data();
        assert_eq!(reloaded.habits.len(), 1);
        assert_eq!(reloaded.completions.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_all_data() {
        let mut store = sqlite_store().await;
        let id = add_daily(&mut store, "Read").await;
        store.toggle_completion(&id, date(2026, 8, 5)).await.unwrap();

        store.delete_all_data().await.unwrap();
        assert!(store.all_habits().is_empty());
        assert!(store.export_data().completions.is_empty());
    }

    #[tokio::test]
    async fn test_correlated_habits_show_up_in_insights() {
        let mut store = sqlite_store().await;
        let a = add_daily(&mut store, "Run").await;
        let b = add_daily(&mut store, "Stretch").await;
        let today = date(2026, 8, 5);

        // Completed together on alternating days across the window.
        for offset in (0..14).step_by(2) {
            let day = today - Duration::days(offset);
            store.toggle_completion(&a, day).await.unwrap();
            store.toggle_completion(&b, day).await.unwrap();
        }

        let insights = store.correlation_insights(today);
        assert_eq!(insights.len(), 1);
        let insight = &insights[0];
        assert!((insight.coefficient - 1.0).abs() < 1e-9);
        assert_eq!(insight.strength, CorrelationStrength::Strong);
        assert!(insight.sample_days >= correlation::MIN_JOINT_SAMPLE);
    }

    #[tokio::test]
    async fn test_uncorrelated_pairs_are_suppressed() {
        let mut store = sqlite_store().await;
        let a = add_daily(&mut store, "Run").await;
        let b = add_daily(&mut store, "Journal").await;
        let today = date(2026, 8, 5);

        // a completed on even offsets, b on every day of the window: b has
        // no variance, so the pair correlates at 0 and is suppressed.
        for offset in 0..30 {
            let day = today - Duration::days(offset);
            if offset % 2 == 0 {
                store.toggle_completion(&a, day).await.unwrap();
            }
            store.toggle_completion(&b, day).await.unwrap();
        }

        assert!(store.correlation_insights(today).is_empty());
    }

    // A record store that refuses every write, for rollback behavior.
    struct OfflineStore;

    #[async_trait]
    impl RecordStore for OfflineStore {
        async fn add_habit(&self, _: &Habit) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".to_string()))
        }
        async fn update_habit(&self, _: &Habit) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".to_string()))
        }
        async fn delete_habit(&self, _: &HabitId) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".to_string()))
        }
        async fn all_habits(&self) -> Result<Vec<Habit>, StorageError> {
            Ok(Vec::new())
        }
        async fn add_completion(
            &self,
            _: &Completion,
        ) -> Result<crate::domain::CompletionId, StorageError> {
            Err(StorageError::Connection("offline".to_string()))
        }
        async fn delete_completion(
            &self,
            _: &HabitId,
            _: NaiveDate,
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".to_string()))
        }
        async fn all_completions(&self) -> Result<Vec<Completion>, StorageError> {
            Ok(Vec::new())
        }
        async fn replace_all(
            &self,
            _: &[Habit],
            _: &[Completion],
        ) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".to_string()))
        }
        async fn delete_all(&self) -> Result<(), StorageError> {
            Err(StorageError::Connection("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_persistence_leaves_memory_unchanged() {
        let habit =
            Habit::new("Read".to_string(), None, None, Schedule::EveryDay, None).unwrap();
        let id = habit.id.clone();
        let mut store = HabitStore {
            habits: vec![habit],
            completions: Vec::new(),
            records: OfflineStore,
        };
        let day = date(2026, 8, 5);

        assert!(store.toggle_completion(&id, day).await.is_err());
        assert!(!store.is_completed(&id, day));

        assert!(store.soft_delete(&id).await.is_err());
        assert_eq!(store.habits().len(), 1);

        assert!(store
            .add_habit("New".to_string(), None, None, Schedule::EveryDay, None)
            .await
            .is_err());
        assert_eq!(store.all_habits().len(), 1);
    }
}
