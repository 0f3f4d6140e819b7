//! Tally CLI - recurring goals and period progress.

use std::path::PathBuf;
use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use tally_core::{parse_date, Cadence, Goal, GoalId, LogEntry, LogEntryId, DEFAULT_TARGET_VALUE};
use tally_progress::{GoalStats, ProgressTracker};
use tally_storage::{Backend, Storage};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Track recurring goals and progress in the current period", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct GlobalArgs {
    /// Directory holding tally data
    #[arg(long, global = true, default_value = ".tally")]
    data_dir: PathBuf,

    /// Storage backend (json or sqlite)
    #[arg(long, global = true, default_value = "json")]
    backend: String,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Manage log entries
    #[command(subcommand)]
    Log(LogCommand),
    /// Show current-period progress for a goal
    Stats {
        /// Goal ID
        goal_id: String,
        /// Reference date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        at: Option<String>,
    },
}

#[derive(Subcommand)]
enum GoalCommand {
    /// Add a new goal
    Add {
        /// Goal title
        title: String,
        /// Recurrence: daily, weekly or monthly
        #[arg(long, default_value = "daily")]
        cadence: String,
        /// Amount to log per period
        #[arg(long, default_value_t = DEFAULT_TARGET_VALUE, allow_hyphen_values = true)]
        target: i64,
        /// Longer description
        #[arg(long)]
        description: Option<String>,
    },
    /// List goals with their current progress
    List,
    /// Show a goal, its progress and its log entries
    Show {
        /// Goal ID
        id: String,
    },
    /// Delete a goal and its log entries
    Delete {
        /// Goal ID
        id: String,
    },
}

#[derive(Subcommand)]
enum LogCommand {
    /// Log progress against a goal
    Add {
        /// Goal ID
        goal_id: String,
        /// Amount to log
        #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
        value: i64,
        /// Day the progress belongs to (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
        /// Free-form note
        #[arg(long)]
        note: Option<String>,
    },
    /// List a goal's log entries
    List {
        /// Goal ID
        goal_id: String,
    },
    /// Delete a log entry
    Delete {
        /// Log entry ID
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let backend: Backend = cli.global.backend.parse()?;
    let storage = backend
        .open(&cli.global.data_dir)
        .await
        .with_context(|| format!("failed to open {} storage at {}", backend, cli.global.data_dir.display()))?;
    debug!("Using {} storage at {}", backend, cli.global.data_dir.display());

    // Read the clock once per invocation.
    let now = Local::now().naive_local();

    match cli.command {
        Commands::Goal(cmd) => run_goal(cmd, storage, now, cli.global.json).await,
        Commands::Log(cmd) => run_log(cmd, storage, now, cli.global.json).await,
        Commands::Stats { goal_id, at } => {
            let goal_id = parse_goal_id(&goal_id)?;
            let reference = match at {
                Some(date) => parse_date(&date)?.and_time(now.time()),
                None => now,
            };
            let tracker = ProgressTracker::new(storage);
            let Some(goal_stats) = tracker.goal_stats(goal_id, reference).await? else {
                bail!("Goal not found: {}", goal_id);
            };

            if cli.global.json {
                println!("{}", serde_json::to_string_pretty(&goal_stats.stats)?);
            } else {
                println!("{}", format_goal_line(&goal_stats));
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run_goal(
    cmd: GoalCommand,
    mut storage: Box<dyn Storage>,
    now: NaiveDateTime,
    json: bool,
) -> Result<()> {
    match cmd {
        GoalCommand::Add { title, cadence, target, description } => {
            let cadence: Cadence = cadence.parse()?;
            let mut goal = Goal::new(title, cadence)?.with_target_value(target);
            if let Some(description) = description {
                goal = goal.with_description(description);
            }
            storage.save_goal(&goal).await?;
            info!("Created goal {}", goal.id);

            if json {
                println!("{}", serde_json::to_string_pretty(&goal)?);
            } else {
                println!("Added goal: {} - {} ({}, target {})", goal.id, goal.title, goal.cadence, goal.target_value);
            }
        }
        GoalCommand::List => {
            let tracker = ProgressTracker::new(storage);
            let snapshot = tracker.snapshot(now).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot.goals)?);
            } else {
                println!("Goals ({})", snapshot.goals.len());
                for goal_stats in &snapshot.goals {
                    println!("  {}", format_goal_line(goal_stats));
                }
            }
        }
        GoalCommand::Show { id } => {
            let goal_id = parse_goal_id(&id)?;
            let logs = storage.list_logs(goal_id).await?;
            let tracker = ProgressTracker::new(storage);
            let Some(goal_stats) = tracker.goal_stats(goal_id, now).await? else {
                bail!("Goal not found: {}", goal_id);
            };

            if json {
                let value = serde_json::json!({ "goal": goal_stats, "logs": logs });
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            let goal = &goal_stats.goal;
            println!("Goal: {}", goal.id);
            println!("  Title: {}", goal.title);
            if let Some(description) = &goal.description {
                println!("  Description: {}", description);
            }
            println!("  Cadence: {}", goal.cadence);
            println!("  Target: {}", goal.target_value);
            println!("  Created: {}", goal.created_at);
            println!(
                "  Period: {} .. {}",
                goal_stats.stats.period_start, goal_stats.stats.period_end
            );
            println!("  Progress: {}%", goal_stats.stats.progress_percent);
            println!("  Logs ({})", logs.len());
            for entry in &logs {
                println!("    {}", format_log_line(entry));
            }
        }
        GoalCommand::Delete { id } => {
            let goal_id = parse_goal_id(&id)?;
            if !storage.delete_goal(goal_id).await? {
                bail!("Goal not found: {}", goal_id);
            }
            println!("Deleted goal: {}", goal_id);
        }
    }

    Ok(())
}

async fn run_log(
    cmd: LogCommand,
    mut storage: Box<dyn Storage>,
    now: NaiveDateTime,
    json: bool,
) -> Result<()> {
    match cmd {
        LogCommand::Add { goal_id, value, date, note } => {
            let goal_id = parse_goal_id(&goal_id)?;
            let entry_date = match date {
                Some(date) => parse_date(&date)?,
                None => now.date(),
            };
            let mut entry = LogEntry::new(goal_id, entry_date).with_value(value);
            if let Some(note) = note {
                entry = entry.with_note(note);
            }
            storage.save_log(&entry).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                println!("Logged {} on {} for goal {} ({})", entry.value, entry.entry_date, goal_id, entry.id);
            }
        }
        LogCommand::List { goal_id } => {
            let goal_id = parse_goal_id(&goal_id)?;
            if storage.load_goal(goal_id).await?.is_none() {
                bail!("Goal not found: {}", goal_id);
            }
            let logs = storage.list_logs(goal_id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&logs)?);
            } else {
                println!("Logs ({})", logs.len());
                for entry in &logs {
                    println!("  {}", format_log_line(entry));
                }
            }
        }
        LogCommand::Delete { id } => {
            let log_id: LogEntryId = id.parse().map_err(|_| anyhow!("Invalid log ID: {}", id))?;
            if !storage.delete_log(log_id).await? {
                bail!("Log entry not found: {}", log_id);
            }
            println!("Deleted log entry: {}", log_id);
        }
    }

    Ok(())
}

fn parse_goal_id(s: &str) -> Result<GoalId> {
    s.parse().map_err(|_| anyhow!("Invalid goal ID: {}", s))
}

fn format_goal_line(goal_stats: &GoalStats) -> String {
    let goal = &goal_stats.goal;
    let stats = &goal_stats.stats;
    format!(
        "{} | {:<7} | {:>3}% | {} .. {} | {}",
        goal.id,
        goal.cadence.as_str().to_uppercase(),
        stats.progress_percent,
        stats.period_start,
        stats.period_end,
        goal.title,
    )
}

fn format_log_line(entry: &LogEntry) -> String {
    match &entry.note {
        Some(note) => format!("{} | {} | {:+} | {}", entry.id, entry.entry_date, entry.value, note),
        None => format!("{} | {} | {:+}", entry.id, entry.entry_date, entry.value),
    }
}
