/// Pearson correlation between habit completion series
///
/// The engine itself is just the coefficient over two pre-aligned 0/1 series.
/// Alignment is the caller's job and `joint_series` does it: only dates where
/// both habits are active contribute, days where either is inactive are
/// dropped from both sides rather than counted as misses.

use serde::Serialize;
use chrono::{Duration, NaiveDate};
use crate::analytics::stats::is_done;
use crate::domain::{Completion, Habit};

/// Minimum jointly-active days before a pair is worth correlating
pub const MIN_JOINT_SAMPLE: usize = 5;

/// Coefficients with |r| at or below this are treated as noise and
/// suppressed from insight output
pub const SIGNAL_FLOOR: f64 = 0.2;

/// Reported strength band of a correlation coefficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CorrelationStrength {
    Strong,
    Moderate,
    Weak,
}

impl CorrelationStrength {
    /// Classify a coefficient by magnitude
    pub fn classify(r: f64) -> Self {
        let magnitude = r.abs();
        if magnitude >= 0.6 {
            CorrelationStrength::Strong
        } else if magnitude >= 0.4 {
            CorrelationStrength::Moderate
        } else {
            CorrelationStrength::Weak
        }
    }
}

/// Pearson correlation coefficient of two equal-length series
///
/// Inputs must be non-empty and the same length; violating that is a
/// programmer error and panics rather than returning a misleading number.
/// Zero variance in either series is a defined 0.0 result, and the output is
/// clamped to [-1, 1] to absorb floating-point overshoot.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "correlation series must be equal length");
    assert!(!a.is_empty(), "correlation series must be non-empty");

    let n = a.len() as f64;
    let sum_x: f64 = a.iter().sum();
    let sum_y: f64 = b.iter().sum();
    let sum_xy: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let sum_x2: f64 = a.iter().map(|x| x * x).sum();
    let sum_y2: f64 = b.iter().map(|y| y * y).sum();

    let denominator = ((n * sum_x2 - sum_x * sum_x) * (n * sum_y2 - sum_y * sum_y)).sqrt();
    if denominator == 0.0 || denominator.is_nan() {
        return 0.0;
    }

    ((n * sum_xy - sum_x * sum_y) / denominator).clamp(-1.0, 1.0)
}

/// Build the aligned 0/1 completion series for two habits
///
/// Scans the trailing window ending at `as_of` and keeps only the dates where
/// both habits are active. The two returned series are always equal length.
pub fn joint_series(
    a: &Habit,
    b: &Habit,
    completions: &[Completion],
    as_of: NaiveDate,
    window_days: u32,
) -> (Vec<f64>, Vec<f64>) {
    let mut xs = Vec::new();
    let mut ys = Vec::new();

    for offset in 0..window_days {
        let date = as_of - Duration::days(offset as i64);
        if !a.is_active_on(date) || !b.is_active_on(date) {
            continue;
        }
        xs.push(if is_done(completions, &a.id, date) { 1.0 } else { 0.0 });
        ys.push(if is_done(completions, &b.id, date) { 1.0 } else { 0.0 });
    }

    (xs, ys)
}
