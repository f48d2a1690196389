//! evcat-curate library interface
//!
//! Curation of the event catalog: cleanup pipeline, region admissibility,
//! venue enrichment and the import routines the CLI drives. Exposed as a
//! library for integration testing.

pub mod services;
pub mod utils;
pub mod validators;
pub mod workflow;

pub use services::venue_filter::VenueFilter;
pub use workflow::{CleanupPipeline, CleanupReport, CleanupStage, StageOutcome};
