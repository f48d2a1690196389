//! Venue-master enrichment
//!
//! Backfills address, neighborhood, coordinates and capacity on stored
//! records from a venue master file keyed by venue name:
//!
//! ```json
//! { "Gazarte": { "address": "Βουτάδων 32-34", "neighborhood": "Gazi",
//!                "lat": 37.978, "lng": 23.713, "capacity": 900 } }
//! ```
//!
//! Stored names match master keys case-insensitively. Venues missing from the
//! master are skipped and reported, never fatal.

use evcat_common::db::{self, VenueDetails};
use evcat_common::events::{CurationEvent, EventBus};
use evcat_common::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

/// Venues with at least this many records are warned about when unmatched
pub const NOTABLE_MISS_THRESHOLD: i64 = 5;

/// Venue master data indexed by lowercased venue name
#[derive(Debug, Clone, Default)]
pub struct VenueMaster {
    entries: HashMap<String, VenueDetails>,
}

impl VenueMaster {
    /// Parse a master document (JSON object of name → details)
    pub fn parse(content: &str) -> Result<Self> {
        let raw: HashMap<String, VenueDetails> = serde_json::from_str(content)?;
        Ok(Self::from_entries(raw))
    }

    /// Load a master document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidInput(format!("Failed to read venue master {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, VenueDetails)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(name, details)| (name.to_lowercase(), details))
            .collect();
        Self { entries }
    }

    /// Look up a venue by name, ignoring case
    pub fn lookup(&self, venue_name: &str) -> Option<&VenueDetails> {
        self.entries.get(&venue_name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of one enrichment pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Distinct venues whose records were updated
    pub venues_enriched: u64,
    /// Records touched across all venues
    pub records_updated: u64,
    /// Venues absent from the master
    pub skipped: u64,
    /// Venues whose update failed
    pub errors: u64,
}

/// Apply `master` to every distinct stored venue
pub async fn enrich_venues(
    pool: &SqlitePool,
    master: &VenueMaster,
    event_bus: &EventBus,
) -> Result<EnrichmentReport> {
    let venues = db::fetch_distinct_venues(pool).await?;
    info!(
        distinct_venues = venues.len(),
        master_entries = master.len(),
        "Enriching stored venues from master data"
    );

    let mut report = EnrichmentReport::default();

    for (venue_name, record_count) in venues {
        let Some(details) = master.lookup(&venue_name) else {
            if record_count >= NOTABLE_MISS_THRESHOLD {
                warn!(venue = %venue_name, record_count, "Venue not in master data");
            } else {
                debug!(venue = %venue_name, record_count, "Venue not in master data");
            }
            event_bus.emit_lossy(CurationEvent::VenueLookupMiss {
                venue_name,
                record_count,
            });
            report.skipped += 1;
            continue;
        };

        match db::apply_venue_details(pool, &venue_name, details).await {
            Ok(0) => {}
            Ok(updated) => {
                info!(venue = %venue_name, records = updated, "Venue enriched");
                event_bus.emit_lossy(CurationEvent::VenueEnriched {
                    venue_name,
                    records_updated: updated,
                });
                report.venues_enriched += 1;
                report.records_updated += updated;
            }
            Err(e) => {
                error!(venue = %venue_name, error = %e, "Venue enrichment failed");
                report.errors += 1;
            }
        }
    }

    info!(
        venues_enriched = report.venues_enriched,
        records_updated = report.records_updated,
        skipped = report.skipped,
        errors = report.errors,
        "Venue enrichment complete"
    );

    Ok(report)
}
