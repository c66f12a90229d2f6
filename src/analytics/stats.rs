/// Aggregate statistics over the habit and completion collections
///
/// Pure functions over `(habits, completions, date)`. Every percentage leaves
/// here as an integer 0-100, rounded once at the boundary; intermediate math
/// stays in f64.
///
/// Two aggregation styles coexist on purpose: the weekday pattern and the
/// rolling windows average per-day percentages, while the weekend/weekday
/// split pools raw counts across its bucket before taking a single ratio.

use std::collections::BTreeSet;
use serde::Serialize;
use chrono::{Datelike, Duration, NaiveDate};
use crate::domain::{Completion, Habit, HabitId};

/// Trailing window, in days, used by the pattern statistics
pub const PATTERN_WINDOW_DAYS: u32 = 30;

/// Chart-friendly labels indexed 0=Sunday..6=Saturday
const WEEKDAY_LABELS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// A single labeled percentage for chart consumption
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelledRate {
    pub label: String,
    pub value: u8,
}

/// Pooled completion ratios for weekend days vs weekdays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekSplit {
    /// Saturday + Sunday, pooled
    pub weekend: u8,
    /// Monday through Friday, pooled
    pub weekday: u8,
}

/// Check whether a completion is recorded for the habit on the date
pub fn is_done(completions: &[Completion], habit_id: &HabitId, date: NaiveDate) -> bool {
    completions
        .iter()
        .any(|c| c.habit_id == *habit_id && c.date == date)
}

/// Count habits active on the given date
pub fn active_habits_count(habits: &[Habit], date: NaiveDate) -> usize {
    habits.iter().filter(|h| h.is_active_on(date)).count()
}

/// Count active habits on the date that also have a completion for it
pub fn completed_count(habits: &[Habit], completions: &[Completion], date: NaiveDate) -> usize {
    habits
        .iter()
        .filter(|h| h.is_active_on(date) && is_done(completions, &h.id, date))
        .count()
}

/// Percentage of active habits completed on the date, 0 when none are active
pub fn completion_rate(habits: &[Habit], completions: &[Completion], date: NaiveDate) -> u8 {
    let active = active_habits_count(habits, date);
    if active == 0 {
        return 0;
    }
    let completed = completed_count(habits, completions, date);
    ((completed as f64 / active as f64) * 100.0).round() as u8
}

/// Count days on which every active habit was completed
///
/// Scans the distinct completion dates plus `today` (so an empty today still
/// gets judged). A date with zero active habits is excluded, never perfect.
pub fn perfect_days_count(habits: &[Habit], completions: &[Completion], today: NaiveDate) -> usize {
    let mut dates: BTreeSet<NaiveDate> = completions.iter().map(|c| c.date).collect();
    dates.insert(today);

    dates
        .iter()
        .filter(|&&date| {
            let active: Vec<&Habit> =
                habits.iter().filter(|h| h.is_active_on(date)).collect();
            !active.is_empty()
                && active.iter().all(|h| is_done(completions, &h.id, date))
        })
        .count()
}

/// Average per-date completion percentage for each weekday
///
/// Scans the trailing pattern window; for every date matching a weekday slot
/// with at least one active habit, the date's percentage joins that slot's
/// average. Slots with no qualifying dates report 0. Labels come from a fixed
/// Sunday-first array, never from the clock source.
pub fn weekday_pattern(
    habits: &[Habit],
    completions: &[Completion],
    today: NaiveDate,
) -> Vec<LabelledRate> {
    let mut sums = [0.0f64; 7];
    let mut counts = [0u32; 7];

    for offset in 0..PATTERN_WINDOW_DAYS {
        let date = today - Duration::days(offset as i64);
        let active = active_habits_count(habits, date);
        if active == 0 {
            continue;
        }
        let completed = completed_count(habits, completions, date);
        let slot = date.weekday().num_days_from_sunday() as usize;
        sums[slot] += completed as f64 / active as f64 * 100.0;
        counts[slot] += 1;
    }

    (0..7)
        .map(|slot| LabelledRate {
            label: WEEKDAY_LABELS[slot].to_string(),
            value: if counts[slot] == 0 {
                0
            } else {
                (sums[slot] / counts[slot] as f64).round() as u8
            },
        })
        .collect()
}

/// Pooled weekend vs weekday completion ratios over the pattern window
///
/// Sums completed and active counts across each bucket first, then takes one
/// ratio per bucket. This is a pooled total, not an average of the per-day
/// percentages.
pub fn weekend_weekday_rates(
    habits: &[Habit],
    completions: &[Completion],
    today: NaiveDate,
) -> WeekSplit {
    let mut weekend = (0usize, 0usize); // (completed, active)
    let mut weekday = (0usize, 0usize);

    for offset in 0..PATTERN_WINDOW_DAYS {
        let date = today - Duration::days(offset as i64);
        let active = active_habits_count(habits, date);
        if active == 0 {
            continue;
        }
        let completed = completed_count(habits, completions, date);
        let slot = date.weekday().num_days_from_sunday();
        let bucket = if slot == 0 || slot == 6 { &mut weekend } else { &mut weekday };
        bucket.0 += completed;
        bucket.1 += active;
    }

    let ratio = |(completed, active): (usize, usize)| -> u8 {
        if active == 0 {
            0
        } else {
            (completed as f64 / active as f64 * 100.0).round() as u8
        }
    };

    WeekSplit { weekend: ratio(weekend), weekday: ratio(weekday) }
}

/// Mean of per-day completion percentages over a trailing window
///
/// Days with zero active habits contribute 0 to the mean rather than being
/// dropped. `days = 1` is today's rate.
pub fn window_rate(
    habits: &[Habit],
    completions: &[Completion],
    today: NaiveDate,
    days: u32,
) -> u8 {
    if days == 0 {
        return 0;
    }
    let sum: f64 = (0..days)
        .map(|offset| {
            completion_rate(habits, completions, today - Duration::days(offset as i64)) as f64
        })
        .sum();
    (sum / days as f64).round() as u8
}
