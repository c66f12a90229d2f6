/// Public library interface for the habit ledger
///
/// The core is the habit activity and analytics engine: the activity
/// predicate, streak and correlation calculators, aggregate statistics, and
/// the state store that ties them to a persistent record store. The
/// presentation layer (here, the CLI binary) only ever talks to `HabitStore`.

use std::path::PathBuf;

// Internal modules
mod domain;
mod storage;
mod analytics;
mod store;

// Re-export public modules and types
pub use domain::*;
pub use storage::{RecordStore, SqliteStore, StorageError};
pub use analytics::{
    CorrelationStrength, LabelledRate, WeekSplit, MIN_JOINT_SAMPLE, PATTERN_WINDOW_DAYS,
    SIGNAL_FLOOR, STREAK_SCAN_CAP,
};
pub use store::{CorrelationInsight, ExportBundle, HabitStore, RollingRates, StoreError};

/// Open the SQLite-backed store at the given path and load its state
///
/// This initializes the database schema if needed and reads the committed
/// collections into memory. The returned store is meant to be created once at
/// application start and passed by reference from there on.
pub async fn open(db_path: PathBuf) -> Result<HabitStore<SqliteStore>, StoreError> {
    let records = SqliteStore::new(db_path)?;
    HabitStore::load(records).await
}
