/// Analytics module: pure computation over the habit collections
///
/// Everything here is a synchronous function of its inputs: no I/O, no
/// clock access. The state store passes its snapshot in and the presentation
/// layer gets plain values back.

pub mod correlation;
pub mod stats;
pub mod streak;

pub use correlation::{joint_series, pearson, CorrelationStrength, MIN_JOINT_SAMPLE, SIGNAL_FLOOR};
pub use stats::{
    active_habits_count, completed_count, completion_rate, perfect_days_count,
    weekday_pattern, weekend_weekday_rates, window_rate, LabelledRate, WeekSplit,
    PATTERN_WINDOW_DAYS,
};
pub use streak::{current_streak, longest_streak, STREAK_SCAN_CAP};
