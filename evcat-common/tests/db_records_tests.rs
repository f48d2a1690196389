//! Store accessor tests against a throwaway file-backed database

use chrono::NaiveDate;
use evcat_common::db::{
    apply_description_update, apply_venue_details, compact, count_records, count_upcoming,
    delete_records, fetch_all_records, fetch_distinct_venues, fetch_missing_critical,
    fetch_record, init_database, open_database, upsert_record, DescriptionUpdate, VenueDetails,
};
use evcat_common::{Error, EventRecord};
use tempfile::TempDir;

async fn setup_store() -> (TempDir, sqlx::SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let pool = init_database(&dir.path().join("events.db")).await.unwrap();
    (dir, pool)
}

fn record(id: &str, title: &str, start: &str, venue: &str) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        title: Some(title.to_string()),
        start_date: Some(start.to_string()),
        venue_name: Some(venue.to_string()),
        updated_at: Some("2026-01-01 10:00:00".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_open_database_requires_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = open_database(&dir.path().join("missing.db")).await;
    assert!(matches!(result, Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_init_then_open_existing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("events.db");

    let pool = init_database(&path).await.unwrap();
    upsert_record(&pool, &record("a", "Jazz Night", "2030-07-02T21:00:00", "Half Note Jazz Club"))
        .await
        .unwrap();
    pool.close().await;

    let reopened = open_database(&path).await.unwrap();
    assert_eq!(count_records(&reopened).await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_reports_new_then_existing() {
    let (_dir, pool) = setup_store().await;
    let mut rec = record("a", "Jazz Night", "2030-07-02T21:00:00", "Half Note Jazz Club");

    assert!(upsert_record(&pool, &rec).await.unwrap());

    rec.price_amount = Some(15.0);
    assert!(!upsert_record(&pool, &rec).await.unwrap());

    let stored = fetch_record(&pool, "a").await.unwrap().unwrap();
    assert_eq!(stored.price_amount, Some(15.0));
    assert_eq!(count_records(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_upsert_never_moves_updated_at_backwards() {
    let (_dir, pool) = setup_store().await;
    let mut rec = record("a", "Jazz Night", "2030-07-02T21:00:00", "Half Note Jazz Club");
    rec.updated_at = Some("2020-05-01 10:00:00".to_string());
    upsert_record(&pool, &rec).await.unwrap();

    let inserted = fetch_record(&pool, "a").await.unwrap().unwrap();
    assert_eq!(inserted.updated_at.as_deref(), Some("2020-05-01 10:00:00"));

    // Replayed candidate carrying an older timestamp
    rec.updated_at = Some("2001-01-01 00:00:00".to_string());
    upsert_record(&pool, &rec).await.unwrap();

    let replaced = fetch_record(&pool, "a").await.unwrap().unwrap();
    let stamped = replaced.updated_at.unwrap();
    assert!(stamped.as_str() > "2020-05-01 10:00:00", "updated_at went back to {}", stamped);
}

#[tokio::test]
async fn test_fetch_all_orders_by_start_date() {
    let (_dir, pool) = setup_store().await;
    upsert_record(&pool, &record("late", "B", "2030-08-01T20:00:00", "Gazarte")).await.unwrap();
    upsert_record(&pool, &record("early", "A", "2030-07-01T20:00:00", "Gazarte")).await.unwrap();

    let ids: Vec<String> = fetch_all_records(&pool)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["early".to_string(), "late".to_string()]);
}

#[tokio::test]
async fn test_delete_counts_only_existing_rows() {
    let (_dir, pool) = setup_store().await;
    upsert_record(&pool, &record("a", "A", "2030-07-01T20:00:00", "Gazarte")).await.unwrap();
    upsert_record(&pool, &record("b", "B", "2030-07-01T20:00:00", "Gazarte")).await.unwrap();

    let removed = delete_records(&pool, &["a".to_string(), "ghost".to_string()])
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(delete_records(&pool, &[]).await.unwrap(), 0);
    assert_eq!(count_records(&pool).await.unwrap(), 1);
}

#[tokio::test]
async fn test_missing_critical_query() {
    let (_dir, pool) = setup_store().await;
    upsert_record(&pool, &record("ok", "A", "2030-07-01T20:00:00", "Gazarte")).await.unwrap();
    upsert_record(&pool, &record("no-venue", "B", "2030-07-01T20:00:00", "")).await.unwrap();

    let mut no_title = record("no-title", "", "2030-07-01T20:00:00", "Gazarte");
    no_title.title = None;
    upsert_record(&pool, &no_title).await.unwrap();

    let mut no_date = record("no-date", "C", "", "Gazarte");
    no_date.start_date = None;
    upsert_record(&pool, &no_date).await.unwrap();

    let missing = fetch_missing_critical(&pool).await.unwrap();
    assert_eq!(
        missing,
        vec![
            ("no-date".to_string(), "start_date".to_string()),
            ("no-title".to_string(), "title".to_string()),
            ("no-venue".to_string(), "venue_name".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_count_upcoming_uses_calendar_date() {
    let (_dir, pool) = setup_store().await;
    upsert_record(&pool, &record("yesterday", "A", "2030-06-14T23:59:00", "Gazarte")).await.unwrap();
    upsert_record(&pool, &record("today", "B", "2030-06-15T00:30:00", "Gazarte")).await.unwrap();
    upsert_record(&pool, &record("later", "C", "2030-09-01T20:00:00", "Gazarte")).await.unwrap();
    upsert_record(&pool, &record("garbage", "D", "soon", "Gazarte")).await.unwrap();

    let today = NaiveDate::from_ymd_opt(2030, 6, 15).unwrap();
    assert_eq!(count_upcoming(&pool, today).await.unwrap(), 2);
    assert_eq!(count_records(&pool).await.unwrap(), 4);
}

#[tokio::test]
async fn test_venue_details_backfill_keeps_unset_fields() {
    let (_dir, pool) = setup_store().await;
    let mut rec = record("a", "A", "2030-07-01T20:00:00", "Gazarte");
    rec.venue_address = Some("Voutadon 32".to_string());
    upsert_record(&pool, &rec).await.unwrap();
    upsert_record(&pool, &record("b", "B", "2030-07-02T20:00:00", "Gazarte")).await.unwrap();

    let details = VenueDetails {
        neighborhood: Some("Gazi".to_string()),
        capacity: Some(800),
        ..Default::default()
    };
    assert_eq!(apply_venue_details(&pool, "Gazarte", &details).await.unwrap(), 2);

    let stored = fetch_record(&pool, "a").await.unwrap().unwrap();
    assert_eq!(stored.venue_neighborhood.as_deref(), Some("Gazi"));
    assert_eq!(stored.venue_capacity, Some(800));
    assert_eq!(stored.venue_address.as_deref(), Some("Voutadon 32"));
    assert_ne!(stored.updated_at.as_deref(), Some("2026-01-01 10:00:00"));
}

#[tokio::test]
async fn test_description_update_unknown_id() {
    let (_dir, pool) = setup_store().await;
    let update = DescriptionUpdate {
        full_description_gr: Some("Μια βραδιά τζαζ".to_string()),
        ..Default::default()
    };
    assert_eq!(apply_description_update(&pool, "ghost", &update).await.unwrap(), 0);
}

#[tokio::test]
async fn test_distinct_venues_and_compact() {
    let (_dir, pool) = setup_store().await;
    upsert_record(&pool, &record("a", "A", "2030-07-01T20:00:00", "Gazarte")).await.unwrap();
    upsert_record(&pool, &record("b", "B", "2030-07-01T20:00:00", "Gazarte")).await.unwrap();
    upsert_record(&pool, &record("c", "C", "2030-07-01T20:00:00", "Six D.O.G.S")).await.unwrap();
    upsert_record(&pool, &record("d", "D", "2030-07-01T20:00:00", "")).await.unwrap();

    let venues = fetch_distinct_venues(&pool).await.unwrap();
    assert_eq!(
        venues,
        vec![("Gazarte".to_string(), 2), ("Six D.O.G.S".to_string(), 1)]
    );

    delete_records(&pool, &["a".to_string()]).await.unwrap();
    compact(&pool).await.unwrap();
    assert_eq!(count_records(&pool).await.unwrap(), 3);
}
