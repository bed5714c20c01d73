//! `clash` CLI — check, book and audit venue time slots from the command line.
//!
//! Events live in a JSON file (`--store`, env `CLASH_STORE`, default
//! `events.json`). Every subcommand prints JSON on stdout; logs go to stderr.
//!
//! ## Usage
//!
//! ```sh
//! # Is Room A free from 11:00 to 13:00?
//! clash check --start 2025-11-08T11:00:00Z --end 2025-11-08T13:00:00Z --venue "Room A"
//!
//! # Book it
//! clash create --title Keynote --start 2025-11-08T10:00:00Z --end 2025-11-08T12:00:00Z --venue "Room A"
//!
//! # Book from a JSON request (stdin with `-i -`)
//! clash create -i request.json
//!
//! # Nearby alternatives for a 1.5h slot
//! clash suggest --start 2025-11-08T11:00:00Z --hours 1.5 --venue "Room A"
//!
//! # Gaps of at least 30 minutes in a day
//! clash free --start 2025-11-08T08:00:00Z --end 2025-11-08T18:00:00Z --venue "Room A" --min-minutes 30
//!
//! # Housekeeping
//! clash list --venue "Room A" --all
//! clash cancel 6c1f...
//! clash audit
//! ```

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Duration;
use clap::{Parser, Subcommand};
use clash_engine::api::{
    CheckConflictRequest, CreateEventRequest, ErrorResponse, EventRecord, SuggestRequest,
};
use clash_engine::store::ListFilter;
use clash_engine::{JsonFileStore, Scheduler, SchedulerConfig, TimeSlot};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "clash.toml";

#[derive(Parser)]
#[command(name = "clash", version, about = "Clash-free venue scheduling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file holding committed events
    #[arg(long, env = "CLASH_STORE", default_value = "events.json", global = true)]
    store: PathBuf,

    /// Scheduler settings (TOML); `clash.toml` in the working directory if present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a proposed slot for conflicts (CLEAR / CLASH / ERROR)
    Check {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        venue: Option<String>,
        /// Ignore this event id (e.g. when moving an existing event)
        #[arg(long)]
        exclude: Option<String>,
    },
    /// Create an event if its slot is clear
    Create {
        /// JSON request file ("-" for stdin); replaces the field flags
        #[arg(short, long)]
        input: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        venue: Option<String>,
        #[arg(long)]
        organizer: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        capacity: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        budget: Option<f64>,
    },
    /// Suggest clear slots near a preferred start time
    Suggest {
        #[arg(long)]
        start: String,
        /// Slot length in hours (fractions allowed)
        #[arg(long, allow_negative_numbers = true)]
        hours: f64,
        #[arg(long)]
        venue: Option<String>,
        /// Maximum number of suggestions (default from config)
        #[arg(long)]
        max: Option<usize>,
    },
    /// List events ordered by start time
    List {
        #[arg(long)]
        venue: Option<String>,
        /// Include cancelled events
        #[arg(long)]
        all: bool,
    },
    /// Cancel an event by id
    Cancel { id: String },
    /// Show free windows within a time range
    Free {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        venue: Option<String>,
        /// Skip gaps shorter than this
        #[arg(long, default_value_t = 0)]
        min_minutes: u32,
    },
    /// Report scheduled events that overlap each other
    Audit,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let store = Arc::new(JsonFileStore::new(&cli.store));
    let scheduler = Scheduler::with_config(store, config);

    tracing::debug!(store = %cli.store.display(), "store opened");

    run(&scheduler, cli.command).await
}

async fn run(scheduler: &Scheduler, command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Check {
            start,
            end,
            venue,
            exclude,
        } => {
            let request = CheckConflictRequest {
                start_time: start,
                end_time: end,
                venue,
                exclude_event_id: exclude,
            };
            let response = scheduler.handle_check(&request).await;
            print_json(&response)?;
            // CLASH is an answer, not a failure
            Ok(if response.status == "ERROR" {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Create {
            input,
            title,
            start,
            end,
            venue,
            organizer,
            description,
            category,
            capacity,
            budget,
        } => {
            let request = match input {
                Some(path) => {
                    let json = read_input(&path)?;
                    serde_json::from_str(&json).context("Failed to parse create request JSON")?
                }
                None => CreateEventRequest {
                    title,
                    start_time: start,
                    end_time: end,
                    venue,
                    organizer,
                    description,
                    category,
                    capacity,
                    budget,
                },
            };
            respond(scheduler.handle_create(request).await)
        }
        Commands::Suggest {
            start,
            hours,
            venue,
            max,
        } => {
            let request = SuggestRequest {
                preferred_start: start,
                duration_hours: hours,
                venue,
                max_suggestions: max,
            };
            respond(scheduler.handle_suggest(&request).await)
        }
        Commands::List { venue, all } => {
            let filter = ListFilter {
                resource: venue,
                include_cancelled: all,
            };
            let outcome = scheduler
                .list_events(&filter)
                .await
                .map(|events| events.iter().map(EventRecord::from).collect::<Vec<_>>());
            respond(outcome.map_err(|e| ErrorResponse::from(&e)))
        }
        Commands::Cancel { id } => respond(scheduler.handle_cancel(&id).await),
        Commands::Free {
            start,
            end,
            venue,
            min_minutes,
        } => {
            let outcome = match TimeSlot::parse(&start, &end, venue.as_deref()) {
                Ok(window) => {
                    scheduler
                        .free_windows(&window, Duration::minutes(i64::from(min_minutes)))
                        .await
                }
                Err(e) => Err(e),
            };
            respond(outcome.map_err(|e| ErrorResponse::from(&e)))
        }
        Commands::Audit => {
            let outcome = scheduler.audit().await;
            respond(outcome.map_err(|e| ErrorResponse::from(&e)))
        }
    }
}

/// Print the success body or the error body; the exit code follows.
fn respond<T: Serialize>(outcome: std::result::Result<T, ErrorResponse>) -> Result<ExitCode> {
    match outcome {
        Ok(body) => {
            print_json(&body)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            tracing::debug!(kind = %error.kind, status = error.status_code, "request failed");
            print_json(&error)?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Explicit `--config`, else `clash.toml` when present, else defaults.
fn load_config(path: Option<&Path>) -> Result<SchedulerConfig> {
    match path {
        Some(path) => SchedulerConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            SchedulerConfig::from_file(DEFAULT_CONFIG_FILE)
                .with_context(|| format!("Failed to load config: {}", DEFAULT_CONFIG_FILE))
        }
        None => Ok(SchedulerConfig::default()),
    }
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
    }
}
