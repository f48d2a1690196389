//! Event store accessor
//!
//! Every query and mutation the curation tools perform against the `events`
//! table. Callers re-read state through these functions on every run; nothing
//! here caches records between calls.

use super::models::{DescriptionUpdate, EventRecord, VenueDetails};
use crate::{time, Result};
use chrono::NaiveDate;
use sqlx::SqlitePool;

const RECORD_COLUMNS: &str = "id, title, start_date, venue_name, venue_address, venue_neighborhood, \
     venue_lat, venue_lng, venue_capacity, description, full_description, \
     full_description_en, full_description_gr, price_amount, updated_at";

/// Load every record, ordered by start date then id
pub async fn fetch_all_records(pool: &SqlitePool) -> Result<Vec<EventRecord>> {
    let sql = format!("SELECT {} FROM events ORDER BY start_date, id", RECORD_COLUMNS);
    let records = sqlx::query_as::<_, EventRecord>(&sql).fetch_all(pool).await?;
    Ok(records)
}

/// Load one record by id
pub async fn fetch_record(pool: &SqlitePool, id: &str) -> Result<Option<EventRecord>> {
    let sql = format!("SELECT {} FROM events WHERE id = ?", RECORD_COLUMNS);
    let record = sqlx::query_as::<_, EventRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

/// Ids of records missing a critical field, with the first missing field name
pub async fn fetch_missing_critical(pool: &SqlitePool) -> Result<Vec<(String, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT id,
               CASE
                   WHEN title IS NULL OR TRIM(title) = '' THEN 'title'
                   WHEN start_date IS NULL OR TRIM(start_date) = '' THEN 'start_date'
                   ELSE 'venue_name'
               END AS missing
        FROM events
        WHERE title IS NULL OR TRIM(title) = ''
           OR start_date IS NULL OR TRIM(start_date) = ''
           OR venue_name IS NULL OR TRIM(venue_name) = ''
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Distinct non-empty venue names with their record counts, busiest first
pub async fn fetch_distinct_venues(pool: &SqlitePool) -> Result<Vec<(String, i64)>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT venue_name, COUNT(*) AS record_count
        FROM events
        WHERE venue_name IS NOT NULL AND TRIM(venue_name) != ''
        GROUP BY venue_name
        ORDER BY record_count DESC, venue_name
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Delete records by primary key in a single transaction
///
/// Returns the number of rows actually removed; ids that no longer exist are
/// not counted.
pub async fn delete_records(pool: &SqlitePool, ids: &[String]) -> Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut removed = 0u64;

    for id in ids {
        let result = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        removed += result.rows_affected();
    }

    tx.commit().await?;

    Ok(removed)
}

/// Insert a record or replace the stored copy with the same id
///
/// Returns `true` when the record was new. A new record keeps the source's
/// `updated_at` when one was supplied, otherwise now. Replacing a stored copy
/// always stamps now, so `updated_at` never moves backwards.
pub async fn upsert_record(pool: &SqlitePool, record: &EventRecord) -> Result<bool> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM events WHERE id = ?")
        .bind(&record.id)
        .fetch_optional(pool)
        .await?;

    let now = time::now_text();
    let inserted_at = record.updated_at.clone().unwrap_or_else(|| now.clone());

    sqlx::query(
        r#"
        INSERT INTO events (
            id, title, start_date, venue_name, venue_address, venue_neighborhood,
            venue_lat, venue_lng, venue_capacity, description, full_description,
            full_description_en, full_description_gr, price_amount, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            title = excluded.title,
            start_date = excluded.start_date,
            venue_name = excluded.venue_name,
            venue_address = excluded.venue_address,
            venue_neighborhood = excluded.venue_neighborhood,
            venue_lat = excluded.venue_lat,
            venue_lng = excluded.venue_lng,
            venue_capacity = excluded.venue_capacity,
            description = excluded.description,
            full_description = excluded.full_description,
            full_description_en = excluded.full_description_en,
            full_description_gr = excluded.full_description_gr,
            price_amount = excluded.price_amount,
            updated_at = ?
        "#,
    )
    .bind(&record.id)
    .bind(&record.title)
    .bind(&record.start_date)
    .bind(&record.venue_name)
    .bind(&record.venue_address)
    .bind(&record.venue_neighborhood)
    .bind(record.venue_lat)
    .bind(record.venue_lng)
    .bind(record.venue_capacity)
    .bind(&record.description)
    .bind(&record.full_description)
    .bind(&record.full_description_en)
    .bind(&record.full_description_gr)
    .bind(record.price_amount)
    .bind(&inserted_at)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(existing.is_none())
}

/// Backfill venue-master fields on every record stored under `venue_name`
///
/// `venue_name` is matched exactly; callers resolve case-insensitive matches
/// against the distinct stored names first. Returns affected rows.
pub async fn apply_venue_details(
    pool: &SqlitePool,
    venue_name: &str,
    details: &VenueDetails,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE events
        SET venue_address = COALESCE(?, venue_address),
            venue_neighborhood = COALESCE(?, venue_neighborhood),
            venue_lat = COALESCE(?, venue_lat),
            venue_lng = COALESCE(?, venue_lng),
            venue_capacity = COALESCE(?, venue_capacity),
            updated_at = ?
        WHERE venue_name = ?
        "#,
    )
    .bind(&details.address)
    .bind(&details.neighborhood)
    .bind(details.lat)
    .bind(details.lng)
    .bind(details.capacity)
    .bind(time::now_text())
    .bind(venue_name)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Write enriched description tiers onto one record
///
/// Returns affected rows (0 when the id is unknown).
pub async fn apply_description_update(
    pool: &SqlitePool,
    id: &str,
    update: &DescriptionUpdate,
) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE events
        SET description = COALESCE(?, description),
            full_description = COALESCE(?, full_description),
            full_description_en = COALESCE(?, full_description_en),
            full_description_gr = COALESCE(?, full_description_gr),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.description)
    .bind(&update.full_description)
    .bind(&update.full_description_en)
    .bind(&update.full_description_gr)
    .bind(time::now_text())
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Total number of stored records
pub async fn count_records(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Records whose calendar date is `today` or later
///
/// Records with an unparsable date are not counted.
pub async fn count_upcoming(pool: &SqlitePool, today: NaiveDate) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE date(substr(start_date, 1, 10)) >= ?")
            .bind(today.format("%Y-%m-%d").to_string())
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Reclaim space left by deleted rows; no logical effect on any record
pub async fn compact(pool: &SqlitePool) -> Result<()> {
    sqlx::query("VACUUM").execute(pool).await?;
    Ok(())
}
