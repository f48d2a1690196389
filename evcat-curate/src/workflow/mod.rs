//! Cascading cleanup workflow
//!
//! Five ordered stages over the event store:
//! 1. **past_events** - records dated before today
//! 2. **unknown_times** - records carrying the midnight time-unknown sentinel
//! 3. **duplicates** - all but the best-scoring record per `(title, date)`
//! 4. **missing_fields** - records without title, start date or venue name
//! 5. **storage_reclaim** - compaction, no logical effect
//!
//! Every stage re-reads the store, so a rerun after an interruption converges
//! to the same surviving set.

pub mod cleanup_pipeline;

pub use cleanup_pipeline::CleanupPipeline;

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Cleanup stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStage {
    PastEvents,
    UnknownTimes,
    Duplicates,
    MissingFields,
    StorageReclaim,
}

impl CleanupStage {
    pub const ALL: [CleanupStage; 5] = [
        CleanupStage::PastEvents,
        CleanupStage::UnknownTimes,
        CleanupStage::Duplicates,
        CleanupStage::MissingFields,
        CleanupStage::StorageReclaim,
    ];

    /// Stable identifier used in logs and notifications
    pub fn name(&self) -> &'static str {
        match self {
            CleanupStage::PastEvents => "past_events",
            CleanupStage::UnknownTimes => "unknown_times",
            CleanupStage::Duplicates => "duplicates",
            CleanupStage::MissingFields => "missing_fields",
            CleanupStage::StorageReclaim => "storage_reclaim",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            CleanupStage::PastEvents => "Past-event purge",
            CleanupStage::UnknownTimes => "Malformed-time purge",
            CleanupStage::Duplicates => "Duplicate resolution",
            CleanupStage::MissingFields => "Missing-field purge",
            CleanupStage::StorageReclaim => "Storage reclaim",
        }
    }
}

impl fmt::Display for CleanupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: CleanupStage,
    pub removed: u64,
    /// Records the stage predicate could not evaluate
    pub skipped_malformed: u64,
}

impl StageOutcome {
    pub fn new(stage: CleanupStage, removed: u64) -> Self {
        Self {
            stage,
            removed,
            skipped_malformed: 0,
        }
    }

    pub fn with_skipped(mut self, skipped_malformed: u64) -> Self {
        self.skipped_malformed = skipped_malformed;
        self
    }
}

/// Summary of a cleanup run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub today: NaiveDate,
    pub stages: Vec<StageOutcome>,
    pub total_removed: u64,
    /// Records left in the store
    pub remaining: i64,
    /// Remaining records dated today or later
    pub upcoming: i64,
    /// Set when the run stopped early
    pub cancelled_before: Option<CleanupStage>,
}

impl CleanupReport {
    /// Removal count for `stage`, if it ran
    pub fn removed_by(&self, stage: CleanupStage) -> Option<u64> {
        self.stages
            .iter()
            .find(|outcome| outcome.stage == stage)
            .map(|outcome| outcome.removed)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled_before.is_some()
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cleanup summary ({})", self.today)?;
        for outcome in &self.stages {
            if outcome.stage == CleanupStage::StorageReclaim {
                write!(f, "  {:<16} done", outcome.stage.name())?;
            } else {
                write!(f, "  {:<16} removed {}", outcome.stage.name(), outcome.removed)?;
            }
            if outcome.skipped_malformed > 0 {
                write!(f, " (skipped {} malformed)", outcome.skipped_malformed)?;
            }
            writeln!(f)?;
        }
        if let Some(stage) = self.cancelled_before {
            writeln!(f, "  cancelled before {}", stage.name())?;
        }
        writeln!(f, "Total removed: {}", self.total_removed)?;
        writeln!(f, "Remaining records: {}", self.remaining)?;
        write!(f, "Upcoming records: {}", self.upcoming)
    }
}
