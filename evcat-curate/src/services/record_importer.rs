//! Candidate record import
//!
//! Screens scraped candidates through the venue gate and upserts the admitted
//! ones. Input is a JSON array of records using the stored column names.

use crate::services::venue_filter::VenueFilter;
use evcat_common::db;
use evcat_common::events::EventBus;
use evcat_common::{Error, EventRecord, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};

/// What happened to one candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportDisposition {
    Inserted,
    Updated,
    Rejected,
}

/// Outcome of one import pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub inserted: u64,
    pub updated: u64,
    pub rejected: u64,
    /// Entries that were not records or lacked an id
    pub invalid: u64,
}

impl ImportReport {
    fn record(&mut self, disposition: ImportDisposition) {
        match disposition {
            ImportDisposition::Inserted => self.inserted += 1,
            ImportDisposition::Updated => self.updated += 1,
            ImportDisposition::Rejected => self.rejected += 1,
        }
    }
}

/// Parsed candidate file
#[derive(Debug, Clone, Default)]
pub struct CandidateBatch {
    pub records: Vec<EventRecord>,
    pub invalid: u64,
}

/// Parse a JSON array of candidates, setting aside unusable entries
pub fn parse_candidates(content: &str) -> Result<CandidateBatch> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(content)?;
    let mut batch = CandidateBatch::default();

    for (index, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<EventRecord>(entry) {
            Ok(record) if !record.id.trim().is_empty() => batch.records.push(record),
            Ok(_) => {
                warn!(index, "Candidate without id");
                batch.invalid += 1;
            }
            Err(e) => {
                warn!(index, error = %e, "Malformed candidate");
                batch.invalid += 1;
            }
        }
    }

    Ok(batch)
}

/// Read a candidate file from disk
pub fn load_candidates(path: &Path) -> Result<CandidateBatch> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::InvalidInput(format!("Failed to read candidates {}: {}", path.display(), e))
    })?;
    parse_candidates(&content)
}

/// Gate one candidate and upsert it when admitted
pub async fn import_one(
    pool: &SqlitePool,
    filter: &VenueFilter,
    event_bus: &EventBus,
    candidate: &EventRecord,
) -> Result<ImportDisposition> {
    if !filter.gate(candidate, event_bus) {
        return Ok(ImportDisposition::Rejected);
    }

    if db::upsert_record(pool, candidate).await? {
        Ok(ImportDisposition::Inserted)
    } else {
        Ok(ImportDisposition::Updated)
    }
}

/// Import a parsed batch in order
pub async fn import_candidates(
    pool: &SqlitePool,
    filter: &VenueFilter,
    event_bus: &EventBus,
    batch: &CandidateBatch,
) -> Result<ImportReport> {
    let mut report = ImportReport {
        invalid: batch.invalid,
        ..Default::default()
    };

    for candidate in &batch.records {
        report.record(import_one(pool, filter, event_bus, candidate).await?);
    }

    info!(
        region = filter.region(),
        inserted = report.inserted,
        updated = report.updated,
        rejected = report.rejected,
        invalid = report.invalid,
        "Candidate import complete"
    );

    Ok(report)
}
