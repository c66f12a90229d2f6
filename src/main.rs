/// Main entry point for the habit ledger CLI
///
/// This file sets up logging, parses command line arguments, opens the store,
/// and dispatches one subcommand per invocation. All analytics values printed
/// here come straight from the store's query accessors.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use chrono::{Local, NaiveDate, Weekday};
use tracing::info;

use habit_ledger::{
    ExportBundle, HabitId, HabitStore, Schedule, SqliteStore, TemporarySpan,
};

/// Get the default database path, falling back through sensible locations
fn default_database_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base = dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or(std::env::temp_dir());

    let dir = base.join("habit-ledger");
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("habits.db"))
}

/// Command line arguments for the habit ledger
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable verbose output (implies debug)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new habit
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Restrict to specific weekdays, e.g. --days mon,wed,fri
        #[arg(long, value_delimiter = ',')]
        days: Vec<Weekday>,
        /// Make the habit temporary, running for N days from today
        #[arg(long, conflicts_with = "until")]
        for_days: Option<u32>,
        /// Make the habit temporary, running through the given date
        #[arg(long)]
        until: Option<NaiveDate>,
    },
    /// Edit an existing habit
    Update {
        habit: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Replace the weekday restriction, e.g. --days mon,wed,fri
        #[arg(long, value_delimiter = ',')]
        days: Option<Vec<Weekday>>,
        /// Set (or move) the habit's end date
        #[arg(long, conflicts_with = "open_ended")]
        until: Option<NaiveDate>,
        /// Clear the end date, making the habit open-ended again
        #[arg(long)]
        open_ended: bool,
    },
    /// List habits
    List {
        /// Include soft-deleted habits
        #[arg(long)]
        all: bool,
    },
    /// Toggle a habit's completion for a date (default: today)
    Done {
        habit: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Pause a habit through the given date
    Pause {
        habit: String,
        #[arg(long)]
        until: NaiveDate,
    },
    /// Clear a habit's pause
    Resume { habit: String },
    /// Soft-delete a habit, keeping its history
    Remove { habit: String },
    /// Bring a soft-deleted habit back
    Restore { habit: String },
    /// Permanently delete a habit and its completions
    Purge { habit: String },
    /// Show streaks and completion rates
    Status,
    /// Show weekday and weekend patterns
    Patterns,
    /// Show correlations between habits
    Insights,
    /// Write all data as JSON
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replace all data from a JSON export
    Import { input: PathBuf },
    /// Delete all stored data
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },
}

/// Resolve a habit argument by exact name (case-insensitive) or id prefix
fn resolve_habit(
    store: &HabitStore<SqliteStore>,
    needle: &str,
) -> Result<HabitId, Box<dyn std::error::Error>> {
    let matches: Vec<&habit_ledger::Habit> = store
        .all_habits()
        .iter()
        .filter(|h| {
            h.name.eq_ignore_ascii_case(needle) || h.id.to_string().starts_with(needle)
        })
        .collect();

    match matches.as_slice() {
        [habit] => Ok(habit.id.clone()),
        [] => Err(format!("No habit matches '{}'", needle).into()),
        _ => Err(format!("'{}' is ambiguous; use a longer id prefix", needle).into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = if args.verbose {
        "debug"
    } else if args.debug {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("habit_ledger={}", log_level))
        .with_writer(std::io::stderr)
        .init();

    let db_path = match args.database {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            path
        }
        None => default_database_path()?,
    };

    info!("Using database at: {}", db_path.display());

    let mut store = habit_ledger::open(db_path).await?;
    let today = Local::now().date_naive();

    match args.command {
        Command::Add { name, description, color, days, for_days, until } => {
            let schedule = if days.is_empty() {
                Schedule::EveryDay
            } else {
                Schedule::DaysOfWeek(days)
            };
            let span = match (for_days, until) {
                (Some(days), _) => Some(TemporarySpan::Days(days)),
                (None, Some(date)) => Some(TemporarySpan::Until(date)),
                (None, None) => None,
            };

            let id = store.add_habit(name.clone(), description, color, schedule, span).await?;
            println!("Created habit '{}' ({})", name, id);
        }

        Command::Update { habit, name, description, color, days, until, open_ended } => {
            let id = resolve_habit(&store, &habit)?;
            let patch = habit_ledger::HabitPatch {
                name,
                description: description.map(Some),
                color: color.map(Some),
                schedule: days.map(|days| {
                    if days.is_empty() {
                        Schedule::EveryDay
                    } else {
                        Schedule::DaysOfWeek(days)
                    }
                }),
                ends_on: match (until, open_ended) {
                    (Some(date), _) => Some(Some(date)),
                    (None, true) => Some(None),
                    (None, false) => None,
                },
            };
            store.update_habit(&id, patch).await?;
            println!("Updated.");
        }

        Command::List { all } => {
            let habits: Vec<&habit_ledger::Habit> = if all {
                store.all_habits().iter().collect()
            } else {
                store.habits()
            };

            if habits.is_empty() {
                println!("No habits yet. Create one with 'add'.");
            }
            for habit in habits {
                let mut flags = Vec::new();
                if habit.is_deleted() {
                    flags.push("deleted".to_string());
                }
                if habit.is_paused() {
                    flags.push("paused".to_string());
                }
                if let habit_ledger::Lifecycle::Temporary { ends_on } = habit.lifecycle {
                    flags.push(format!("ends {}", ends_on));
                }
                let suffix = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };
                println!("{:.8}  {}{}", habit.id.to_string(), habit.name, suffix);
            }
        }

        Command::Done { habit, date } => {
            let id = resolve_habit(&store, &habit)?;
            let date = date.unwrap_or(today);
            let completed = store.toggle_completion(&id, date).await?;
            let streak = store.current_streak(&id, today)?;
            if completed {
                println!("Done for {}. Current streak: {} days", date, streak);
            } else {
                println!("Cleared completion for {}.", date);
            }
        }

        Command::Pause { habit, until } => {
            let id = resolve_habit(&store, &habit)?;
            store.pause(&id, until).await?;
            println!("Paused through {}.", until);
        }

        Command::Resume { habit } => {
            let id = resolve_habit(&store, &habit)?;
            store.unpause(&id).await?;
            println!("Resumed.");
        }

        Command::Remove { habit } => {
            let id = resolve_habit(&store, &habit)?;
            store.soft_delete(&id).await?;
            println!("Removed (history kept; 'restore' undoes this).");
        }

        Command::Restore { habit } => {
            let id = resolve_habit(&store, &habit)?;
            store.restore(&id).await?;
            println!("Restored.");
        }

        Command::Purge { habit } => {
            let id = resolve_habit(&store, &habit)?;
            let name = store.habit(&id)?.name.clone();
            store.permanent_delete(&id).await?;
            println!("Permanently deleted '{}' and its completions.", name);
        }

        Command::Status => {
            let habits = store.habits();
            if habits.is_empty() {
                println!("No habits yet. Create one with 'add'.");
                return Ok(());
            }

            let ids: Vec<HabitId> = habits.iter().map(|h| h.id.clone()).collect();
            println!(
                "📊 {} of {} active habits completed today ({}%)",
                store.completed_count(today),
                store.active_habits_count(today),
                store.completion_rate(today)
            );
            println!("Perfect days so far: {}", store.perfect_days_count(today));

            let rates = store.rolling_rates(today);
            println!(
                "Rates: today {}% | 7d {}% | 30d {}% | 365d {}%",
                rates.today, rates.last_week, rates.last_month, rates.last_year
            );

            for id in &ids {
                let habit = store.habit(id)?;
                let mark = if store.is_completed(id, today) { "✓" } else { " " };
                println!(
                    "{} {}  streak {} | best {}",
                    mark,
                    habit.name,
                    store.current_streak(id, today)?,
                    store.longest_streak(id)?
                );
            }
        }

        Command::Patterns => {
            println!("Completion by weekday (last 30 days):");
            for entry in store.weekday_pattern(today) {
                println!("  {:<9} {:>3}%", entry.label, entry.value);
            }
            let split = store.weekend_weekday_rates(today);
            println!("Weekend: {}%  Weekday: {}%", split.weekend, split.weekday);
        }

        Command::Insights => {
            let insights = store.correlation_insights(today);
            if insights.is_empty() {
                println!("No meaningful correlations yet; keep logging.");
            }
            for insight in insights {
                println!(
                    "{} and {}: r = {:+.2} ({:?}, {} shared days)",
                    insight.name_a,
                    insight.name_b,
                    insight.coefficient,
                    insight.strength,
                    insight.sample_days
                );
            }
        }

        Command::Export { output } => {
            let bundle = store.export_data();
            let json = serde_json::to_string_pretty(&bundle)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Command::Import { input } => {
            let json = std::fs::read_to_string(&input)?;
            let bundle: ExportBundle = serde_json::from_str(&json)?;
            let habits = bundle.habits.len();
            let completions = bundle.completions.len();
            store.import_data(bundle).await?;
            println!("Imported {} habits and {} completions.", habits, completions);
        }

        Command::Reset { yes } => {
            if !yes {
                println!("This deletes every habit and completion. Re-run with --yes.");
                return Ok(());
            }
            store.delete_all_data().await?;
            println!("All data deleted.");
        }
    }

    Ok(())
}
