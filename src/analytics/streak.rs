/// Streak calculation over a habit's completion history
///
/// Two deliberately different semantics live here. The current streak walks
/// backward from a reference date and consults the activity predicate, so
/// days the habit wasn't scheduled (or was paused) neither extend nor break
/// the run. The longest streak is pure date-gap arithmetic over the recorded
/// history and ignores schedule and pause entirely. Keep them separate; they
/// answer different questions and are tested separately.

use std::collections::BTreeSet;
use chrono::{Duration, NaiveDate};
use crate::domain::Habit;

/// Hard safety bound on the backward walk, in calendar days
///
/// A true unbroken streak longer than this reports the cap instead of the
/// real length.
pub const STREAK_SCAN_CAP: usize = 365;

/// Lazy sequence of calendar days going backward from a start date
///
/// Explicitly finite: yields at most `cap` days, newest first.
struct DaysBack {
    next: Option<NaiveDate>,
    remaining: usize,
}

impl Iterator for DaysBack {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = current.pred_opt();
        Some(current)
    }
}

/// Iterate calendar days backward from `start`, inclusive, at most `cap` days
fn days_back(start: NaiveDate, cap: usize) -> DaysBack {
    DaysBack { next: Some(start), remaining: cap }
}

/// Count the habit's current run of completed scheduled days as of a date
///
/// A habit has no current streak on a day it isn't active. If `as_of` itself
/// isn't completed yet, counting starts from the previous day instead, so an
/// incomplete today doesn't erase yesterday's streak.
pub fn current_streak(habit: &Habit, done: &BTreeSet<NaiveDate>, as_of: NaiveDate) -> u32 {
    if !habit.is_active_on(as_of) {
        return 0;
    }

    let start = if done.contains(&as_of) {
        as_of
    } else {
        as_of - Duration::days(1)
    };

    let mut streak = 0;
    for day in days_back(start, STREAK_SCAN_CAP) {
        if !habit.is_active_on(day) {
            continue;
        }
        if done.contains(&day) {
            streak += 1;
        } else {
            break;
        }
    }

    streak
}

/// Find the longest run of calendar-consecutive completion dates
///
/// Gap-based only: a 1-day gap between sorted entries extends the run, any
/// other gap resets it. The activity predicate is intentionally not
/// consulted here.
pub fn longest_streak(done: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    let mut previous: Option<NaiveDate> = None;

    for &date in done {
        run = match previous {
            Some(prev) if date - prev == Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        previous = Some(date);
    }

    longest
}
