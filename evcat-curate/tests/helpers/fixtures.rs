//! Record fixtures
//!
//! All dates assume the cleanup runs with today = 2030-06-15.

use chrono::NaiveDate;
use evcat_common::EventRecord;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 6, 15).unwrap()
}

/// Valid record with a real time and an Athens venue
pub fn record(id: &str, title: &str, start_date: &str) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        title: Some(title.to_string()),
        start_date: Some(start_date.to_string()),
        venue_name: Some("Gazarte".to_string()),
        venue_address: Some("Βουτάδων 32-34, Γκάζι".to_string()),
        ..Default::default()
    }
}

pub fn at_venue(mut record: EventRecord, venue: &str) -> EventRecord {
    record.venue_name = Some(venue.to_string());
    record.venue_address = None;
    record
}

/// Long-form text above the 100 character threshold
pub fn long_text(prefix: &str) -> String {
    format!("{} {}", prefix, "Live music, late hours and a crowd that knows every word. ".repeat(3))
}

/// Record carrying every completeness signal (score 280 before recency)
pub fn complete(id: &str, title: &str, start_date: &str) -> EventRecord {
    EventRecord {
        description: Some("Rebetiko evening".to_string()),
        full_description: Some(long_text("Display")),
        full_description_en: Some(long_text("English")),
        full_description_gr: Some(long_text("Ελληνικά")),
        price_amount: Some(15.0),
        ..record(id, title, start_date)
    }
}

/// Eleven-record store used by the end-to-end scenario
///
/// 2 past, 1 midnight sentinel, 1 duplicate pair, 1 empty venue and 5
/// distinct valid records (one dated today, one at 00:00:01).
pub fn scenario() -> Vec<EventRecord> {
    let mut missing_venue = record("missing-venue", "Open Mic", "2030-06-25T20:00:00");
    missing_venue.venue_name = Some(String::new());

    let mut dup_weak = record("dup-weak", "Rebetiko Night", "2030-06-20T22:30:00");
    dup_weak.description = Some("Rebetiko".to_string());

    vec![
        record("past-yesterday", "Yesterday's Gig", "2030-06-14T21:00:00"),
        record("past-old", "New Year's Eve", "2029-12-31T22:00:00"),
        complete("midnight", "Late Show", "2030-07-01T00:00:00"),
        complete("dup-best", "Rebetiko Night", "2030-06-20T21:00:00"),
        dup_weak,
        missing_venue,
        record("valid-today", "Jazz at Six D.O.G.S", "2030-06-15T19:00:00"),
        record("valid-one-second", "After Hours", "2030-06-16T00:00:01"),
        record("valid-1", "Chamber Recital", "2030-06-18T20:30:00"),
        record("valid-2", "Indie Showcase", "2030-06-22T21:00:00"),
        record("valid-3", "Film Night", "2030-07-03T20:00:00"),
    ]
}
