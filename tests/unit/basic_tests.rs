/// Basic unit tests over the public API
use habit_ledger::*;
use chrono::{NaiveDate, Weekday};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_habit_creation() {
    let habit = Habit::new(
        "Morning Run".to_string(),
        Some("A short jog".to_string()),
        None,
        Schedule::EveryDay,
        None,
    );

    assert!(habit.is_ok());
    assert_eq!(habit.unwrap().name, "Morning Run");
}

#[test]
fn test_empty_name_rejected() {
    let habit = Habit::new("".to_string(), None, None, Schedule::EveryDay, None);
    assert!(habit.is_err());
}

#[test]
fn test_weekday_schedule_activity() {
    let habit = Habit::new(
        "Read".to_string(),
        None,
        None,
        Schedule::DaysOfWeek(vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]),
        None,
    )
    .unwrap();

    assert!(!habit.is_active_on(date(2026, 8, 4))); // Tuesday
    assert!(habit.is_active_on(date(2026, 8, 5))); // Wednesday
}

#[test]
fn test_pause_lapses_on_its_own() {
    let mut habit =
        Habit::new("Read".to_string(), None, None, Schedule::EveryDay, None).unwrap();
    let today = date(2026, 8, 5);
    habit.pause = PauseState::Paused { until: date(2026, 8, 8) };

    assert!(!habit.is_active_on(today));
    assert!(habit.is_active_on(date(2026, 8, 9)));
}

#[test]
fn test_sqlite_store_creation() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::new(dir.path().join("habits.db"));
    assert!(store.is_ok());
}

#[tokio::test]
async fn test_open_store() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = habit_ledger::open(dir.path().join("habits.db")).await;
    assert!(store.is_ok());
    assert!(store.unwrap().habits().is_empty());
}
