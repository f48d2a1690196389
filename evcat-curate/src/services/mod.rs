//! Curation services
//!
//! - **duplicate_grouper** - groups same-title same-day records, picks keepers
//! - **record_purger** - audited deletion path shared by every stage
//! - **venue_filter** - region admissibility rules (batch, gate, store sweep)
//! - **venue_enricher** - venue-master backfill
//! - **description_importer** - applies external description results
//! - **record_importer** - gated candidate upsert

pub mod description_importer;
pub mod duplicate_grouper;
pub mod record_importer;
pub mod record_purger;
pub mod venue_enricher;
pub mod venue_filter;

pub use description_importer::{
    apply_description_results, load_manifest, DescriptionImportReport, DescriptionSource,
};
pub use duplicate_grouper::{DuplicateGroup, DuplicateGrouper, GroupingOutcome, ScoredRecord};
pub use record_importer::{
    import_candidates, import_one, load_candidates, CandidateBatch, ImportDisposition,
    ImportReport,
};
pub use record_purger::{PurgeCandidate, RecordPurger};
pub use venue_enricher::{enrich_venues, EnrichmentReport, VenueMaster};
pub use venue_filter::{
    Admissibility, BatchOutcome, RegionRules, RejectionRule, VenueFilter, VenueLocated,
};
