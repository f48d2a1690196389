//! Curation event types and the event bus
//!
//! Every component that removes, rejects or enriches records reports what it
//! did here. The CLI is one subscriber; tests are another. Emission never
//! blocks and never fails the caller when nobody is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

/// Something that happened while curating the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CurationEvent {
    /// A cleanup stage began
    StageStarted {
        stage: String,
        timestamp: DateTime<Utc>,
    },

    /// A record is about to be deleted
    RecordPurged {
        id: String,
        stage: String,
        /// Why the record is being removed (date, matched rule, missing field...)
        reason: String,
    },

    /// A duplicate group was resolved in favour of one keeper
    DuplicateResolved {
        title: String,
        date: String,
        keeper_id: String,
        keeper_score: f64,
        removed_ids: Vec<String>,
    },

    /// A cleanup stage finished
    StageCompleted {
        stage: String,
        removed: u64,
        skipped_malformed: u64,
    },

    /// An incoming candidate failed the region gate
    CandidateRejected {
        id: Option<String>,
        title: Option<String>,
        venue_name: Option<String>,
        rule: String,
    },

    /// Venue-master data was applied to stored records
    VenueEnriched {
        venue_name: String,
        records_updated: u64,
    },

    /// A stored venue has no venue-master entry
    VenueLookupMiss { venue_name: String, record_count: i64 },

    /// Full cleanup finished
    PipelineCompleted {
        total_removed: u64,
        remaining: i64,
        upcoming: i64,
        timestamp: DateTime<Utc>,
    },

    /// Cleanup stopped between stages on request
    PipelineCancelled {
        before_stage: String,
        timestamp: DateTime<Utc>,
    },
}

/// One-line operator notice
impl fmt::Display for CurationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurationEvent::StageStarted { stage, .. } => write!(f, "[{}] started", stage),
            CurationEvent::RecordPurged { id, stage, reason } => {
                write!(f, "[{}] deleted {}: {}", stage, id, reason)
            }
            CurationEvent::DuplicateResolved {
                title,
                date,
                keeper_id,
                keeper_score,
                removed_ids,
            } => write!(
                f,
                "duplicate \"{}\" on {}: kept {} (score {:.3}), removing {}",
                title,
                date,
                keeper_id,
                keeper_score,
                removed_ids.join(", ")
            ),
            CurationEvent::StageCompleted {
                stage,
                removed,
                skipped_malformed,
            } => write!(
                f,
                "[{}] removed {} (skipped {} malformed)",
                stage, removed, skipped_malformed
            ),
            CurationEvent::CandidateRejected {
                id,
                title,
                venue_name,
                rule,
            } => write!(
                f,
                "rejected {} \"{}\" at {}: {}",
                id.as_deref().unwrap_or("-"),
                title.as_deref().unwrap_or("Untitled"),
                venue_name.as_deref().unwrap_or("(no venue)"),
                rule
            ),
            CurationEvent::VenueEnriched {
                venue_name,
                records_updated,
            } => write!(f, "enriched {} ({} records)", venue_name, records_updated),
            CurationEvent::VenueLookupMiss {
                venue_name,
                record_count,
            } => write!(f, "no master data for {} ({} records)", venue_name, record_count),
            CurationEvent::PipelineCompleted {
                total_removed,
                remaining,
                upcoming,
                ..
            } => write!(
                f,
                "cleanup finished: removed {}, {} remaining, {} upcoming",
                total_removed, remaining, upcoming
            ),
            CurationEvent::PipelineCancelled { before_stage, .. } => {
                write!(f, "cleanup cancelled before {}", before_stage)
            }
        }
    }
}

/// Broadcast bus for curation events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CurationEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<CurationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CurationEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1000)
    }
}
