//! Database initialization
//!
//! Opens the SQLite event store and makes sure the `events` table exists.
//! Schema creation is idempotent and safe to run on every start.

use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// How long a connection waits on a locked database before failing
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open the store, creating the file and schema if missing
///
/// Used by flows that legitimately start from an empty catalog (imports).
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = connect(db_path, true).await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_events_table(&pool).await?;

    Ok(pool)
}

/// Open an existing store
///
/// A missing file is reported as `Error::NotFound` rather than silently
/// creating an empty catalog to clean.
pub async fn open_database(db_path: &Path) -> Result<SqlitePool> {
    if !db_path.exists() {
        return Err(Error::NotFound(format!(
            "Event store does not exist: {}",
            db_path.display()
        )));
    }

    let pool = connect(db_path, false).await?;
    info!("Opened existing database: {}", db_path.display());

    create_events_table(&pool).await?;

    Ok(pool)
}

async fn connect(db_path: &Path, create: bool) -> Result<SqlitePool> {
    // WAL lets readers continue while a stage's delete transaction commits
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Create the events table and its lookup indexes
pub async fn create_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            title TEXT,
            description TEXT,
            full_description TEXT,
            full_description_en TEXT,
            full_description_gr TEXT,
            start_date TEXT,
            venue_name TEXT,
            venue_address TEXT,
            venue_neighborhood TEXT,
            venue_lat REAL,
            venue_lng REAL,
            venue_capacity INTEGER,
            price_amount REAL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_start_date ON events(start_date)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_venue_name ON events(venue_name)")
        .execute(pool)
        .await?;

    Ok(())
}
