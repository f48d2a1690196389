//! Database Test Utilities

use anyhow::Result;
use evcat_common::{db, EventRecord};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Create a temporary event store
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("events.db");
    let pool = db::init_database(&db_path).await?;
    Ok((temp_dir, pool))
}

/// Store every record
pub async fn seed(pool: &SqlitePool, records: &[EventRecord]) -> Result<()> {
    for record in records {
        db::upsert_record(pool, record).await?;
    }
    Ok(())
}

/// Stored ids in ascending order
pub async fn stored_ids(pool: &SqlitePool) -> Result<Vec<String>> {
    let mut ids: Vec<String> = db::fetch_all_records(pool)
        .await?
        .into_iter()
        .map(|r| r.id)
        .collect();
    ids.sort();
    Ok(ids)
}
