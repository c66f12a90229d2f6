/// End-to-end tests over the store and its SQLite record store
use habit_ledger::*;
use chrono::{Duration, NaiveDate, Weekday};
use tempfile::TempDir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_full_tracking_workflow() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = habit_ledger::open(dir.path().join("habits.db")).await.unwrap();
    let today = date(2026, 8, 5); // a Wednesday

    let run = store
        .add_habit("Run".to_string(), None, None, Schedule::EveryDay, None)
        .await
        .unwrap();
    let read = store
        .add_habit(
            "Read".to_string(),
            None,
            Some("blue".to_string()),
            Schedule::DaysOfWeek(vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]),
            None,
        )
        .await
        .unwrap();

    // Wednesday: both active; Tuesday: only the daily habit.
    assert_eq!(store.active_habits_count(today), 2);
    assert_eq!(store.active_habits_count(date(2026, 8, 4)), 1);

    // Log three days of the daily habit and Wednesday of the reading habit.
    for offset in 0..3 {
        store
            .toggle_completion(&run, today - Duration::days(offset))
            .await
            .unwrap();
    }
    store.toggle_completion(&read, today).await.unwrap();

    assert_eq!(store.current_streak(&run, today).unwrap(), 3);
    assert_eq!(store.longest_streak(&run).unwrap(), 3);
    assert_eq!(store.completion_rate(today), 100);
    assert!(store.perfect_days_count(today) >= 1);

    // Five Wednesdays fall in the 30-day window; only today's scored 100%.
    let pattern = store.weekday_pattern(today);
    assert_eq!(pattern.len(), 7);
    assert_eq!(pattern[3].label, "Wednesday");
    assert_eq!(pattern[3].value, 20);
}

#[tokio::test]
async fn test_state_survives_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("habits.db");
    let today = date(2026, 8, 5);

    let id = {
        let mut store = habit_ledger::open(db_path.clone()).await.unwrap();
        let id = store
            .add_habit("Run".to_string(), None, None, Schedule::EveryDay, None)
            .await
            .unwrap();
        store.toggle_completion(&id, today).await.unwrap();
        id
    };

    let store = habit_ledger::open(db_path).await.unwrap();
    assert_eq!(store.habits().len(), 1);
    assert!(store.is_completed(&id, today));
    assert_eq!(store.current_streak(&id, today).unwrap(), 1);
}

#[tokio::test]
async fn test_export_import_between_stores() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut source = habit_ledger::open(dir.path().join("source.db")).await.unwrap();
    let today = date(2026, 8, 5);

    let id = source
        .add_habit("Run".to_string(), None, None, Schedule::EveryDay, None)
        .await
        .unwrap();
    source.toggle_completion(&id, today).await.unwrap();
    source
        .toggle_completion(&id, today - Duration::days(1))
        .await
        .unwrap();

    let json = serde_json::to_string(&source.export_data()).unwrap();

    let mut target = habit_ledger::open(dir.path().join("target.db")).await.unwrap();
    let bundle: ExportBundle = serde_json::from_str(&json).unwrap();
    target.import_data(bundle).await.unwrap();

    assert_eq!(target.export_data(), source.export_data());
    assert_eq!(target.current_streak(&id, today).unwrap(), 2);
}

#[tokio::test]
async fn test_soft_delete_restore_and_purge() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("habits.db");
    let today = date(2026, 8, 5);

    let mut store = habit_ledger::open(db_path.clone()).await.unwrap();
    let id = store
        .add_habit("Run".to_string(), None, None, Schedule::EveryDay, None)
        .await
        .unwrap();
    store.toggle_completion(&id, today).await.unwrap();

    store.soft_delete(&id).await.unwrap();
    assert!(store.habits().is_empty());

    // The soft delete is durable and the history is still there.
    drop(store);
    let mut store = habit_ledger::open(db_path.clone()).await.unwrap();
    assert!(store.habits().is_empty());
    assert_eq!(store.export_data().completions.len(), 1);

    store.restore(&id).await.unwrap();
    assert_eq!(store.habits().len(), 1);
    assert_eq!(store.current_streak(&id, today).unwrap(), 1);

    store.permanent_delete(&id).await.unwrap();
    drop(store);
    let store = habit_ledger::open(db_path).await.unwrap();
    assert!(store.all_habits().is_empty());
    assert!(store.export_data().completions.is_empty());
}

#[tokio::test]
async fn test_insights_over_persisted_data() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut store = habit_ledger::open(dir.path().join("habits.db")).await.unwrap();
    let today = date(2026, 8, 5);

    let gym = store
        .add_habit("Gym".to_string(), None, None, Schedule::EveryDay, None)
        .await
        .unwrap();
    let sleep = store
        .add_habit("Sleep early".to_string(), None, None, Schedule::EveryDay, None)
        .await
        .unwrap();

    // The two habits always succeed and fail together.
    for offset in 0..20 {
        if offset % 3 != 0 {
            let day = today - Duration::days(offset);
            store.toggle_completion(&gym, day).await.unwrap();
            store.toggle_completion(&sleep, day).await.unwrap();
        }
    }

    let insights = store.correlation_insights(today);
    assert_eq!(insights.len(), 1);
    assert!(insights[0].coefficient > 0.9);
    assert_eq!(insights[0].strength, CorrelationStrength::Strong);
}
