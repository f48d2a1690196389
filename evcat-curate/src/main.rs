//! evcat-curate - event catalog curation tool
//!
//! Runs the five-stage cleanup over the event store by default. Subcommands
//! cover the corrective venue sweep, venue-master enrichment, description
//! import and gated candidate import.
//!
//! Logs and operator notices go to stderr; the summary goes to stdout.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use evcat_common::config::{self, TomlConfig};
use evcat_common::db;
use evcat_common::events::EventBus;
use evcat_curate::services::{
    apply_description_results, enrich_venues, import_candidates, load_candidates, load_manifest,
    RecordPurger, VenueFilter, VenueMaster,
};
use evcat_curate::workflow::CleanupPipeline;
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status for a cleanup cancelled between stages
const EXIT_CANCELLED: u8 = 130;

/// Command-line arguments for evcat-curate
#[derive(Parser, Debug)]
#[command(name = "evcat-curate")]
#[command(about = "Curates the cultural-event catalog store")]
#[command(version)]
struct Args {
    /// Event store (SQLite file)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Bootstrap configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Region rule file (defaults to the bundled Athens rules)
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the five-stage cleanup (default)
    Clean {
        /// Treat this date as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Delete stored records the current region rules reject
    SweepVenues,
    /// Backfill venue fields from a venue master file
    EnrichVenues {
        #[arg(long)]
        master: PathBuf,
    },
    /// Apply description results listed in a manifest
    ApplyDescriptions {
        #[arg(long)]
        manifest: PathBuf,
    },
    /// Import candidate records through the region gate
    Import {
        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let toml_config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&toml_config.logging.level);

    info!("Starting evcat-curate {}", env!("CARGO_PKG_VERSION"));

    let db_path = config::resolve_database_path(args.database.as_deref(), &toml_config);
    info!(database = %db_path.display(), "Using event store");

    let rules_path = args.rules.clone().or_else(|| toml_config.rules_path.clone());
    let command = args.command.unwrap_or(Command::Clean { today: None });
    let max_lock_wait_ms = toml_config.store.max_lock_wait_ms;

    let pool = match &command {
        Command::Import { .. } => db::init_database(&db_path).await,
        _ => db::open_database(&db_path).await,
    }
    .with_context(|| format!("Failed to open event store {}", db_path.display()))?;

    let event_bus = EventBus::default();
    let notices = spawn_notice_printer(&event_bus);

    let outcome = execute(
        command,
        pool.clone(),
        event_bus,
        rules_path.as_deref(),
        max_lock_wait_ms,
        args.json,
    )
    .await;

    // Every bus handle is gone once execute returns; the printer drains and exits
    if let Err(e) = notices.await {
        warn!("Notice printer failed: {}", e);
    }
    pool.close().await;

    outcome
}

async fn execute(
    command: Command,
    pool: SqlitePool,
    event_bus: EventBus,
    rules_path: Option<&Path>,
    max_lock_wait_ms: u64,
    json: bool,
) -> Result<ExitCode> {
    match command {
        Command::Clean { today } => {
            let today = today.unwrap_or_else(evcat_common::time::today_local);
            let cancel_token = CancellationToken::new();
            spawn_ctrl_c_handler(cancel_token.clone());

            let pipeline = CleanupPipeline::new(pool, event_bus).with_max_lock_wait(max_lock_wait_ms);
            let report = pipeline
                .run(today, &cancel_token)
                .await
                .context("Cleanup pipeline failed")?;

            print_summary(&report, json, || report.to_string())?;

            if report.is_cancelled() {
                Ok(ExitCode::from(EXIT_CANCELLED))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Command::SweepVenues => {
            let filter = VenueFilter::load_or_bundled(rules_path).context("Failed to load region rules")?;
            let purger = RecordPurger::new(pool, event_bus, max_lock_wait_ms);
            let removed = filter.sweep_store(&purger).await.context("Venue sweep failed")?;

            let summary = SweepSummary {
                region: filter.region().to_string(),
                rules_version: filter.version(),
                removed,
            };
            print_summary(&summary, json, || {
                format!(
                    "Venue sweep ({} rules v{}): removed {}",
                    summary.region, summary.rules_version, summary.removed
                )
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::EnrichVenues { master } => {
            let master = VenueMaster::load(&master).context("Failed to load venue master")?;
            let report = enrich_venues(&pool, &master, &event_bus)
                .await
                .context("Venue enrichment failed")?;

            print_summary(&report, json, || {
                format!(
                    "Venues enriched: {}\nRecords updated: {}\nSkipped (not in master): {}\nErrors: {}",
                    report.venues_enriched, report.records_updated, report.skipped, report.errors
                )
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::ApplyDescriptions { manifest } => {
            let sources = load_manifest(&manifest).context("Failed to load manifest")?;
            let report = apply_description_results(&pool, &sources)
                .await
                .context("Description import failed")?;

            print_summary(&report, json, || {
                format!(
                    "Applied: {}\nNot found: {}\nFailed: {}\nEmpty: {}",
                    report.applied, report.not_found, report.failed, report.empty
                )
            })?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Import { file } => {
            let filter = VenueFilter::load_or_bundled(rules_path).context("Failed to load region rules")?;
            let batch = load_candidates(&file).context("Failed to load candidates")?;
            let report = import_candidates(&pool, &filter, &event_bus, &batch)
                .await
                .context("Candidate import failed")?;

            print_summary(&report, json, || {
                format!(
                    "Inserted: {}\nUpdated: {}\nRejected: {}\nInvalid: {}",
                    report.inserted, report.updated, report.rejected, report.invalid
                )
            })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[derive(Debug, Serialize)]
struct SweepSummary {
    region: String,
    rules_version: u32,
    removed: u64,
}

fn print_summary<T, F>(summary: &T, json: bool, text: F) -> Result<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    // RUST_LOG overrides the configured level
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Render bus notices on stderr until every sender is dropped
fn spawn_notice_printer(event_bus: &EventBus) -> JoinHandle<()> {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match rx.recv().await {
                Ok(event) => eprintln!("{}", event),
                Err(RecvError::Lagged(missed)) => eprintln!("({} notices dropped)", missed),
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Cancel the cleanup on Ctrl+C; the pipeline stops before its next stage
fn spawn_ctrl_c_handler(cancel_token: CancellationToken) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received Ctrl+C, cancelling after the current stage");
                cancel_token.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });
}
