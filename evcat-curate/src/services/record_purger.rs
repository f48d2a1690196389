//! Record Purger
//!
//! The single path through which curation deletes records. Each deletion is
//! logged and announced with its id, stage and reason before the deleting
//! transaction commits.

use crate::utils::retry_on_lock;
use evcat_common::db;
use evcat_common::events::{CurationEvent, EventBus};
use evcat_common::Result;
use sqlx::SqlitePool;
use tracing::info;

/// Record marked for deletion together with the rationale
#[derive(Debug, Clone, PartialEq)]
pub struct PurgeCandidate {
    pub id: String,
    pub reason: String,
}

impl PurgeCandidate {
    pub fn new(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Deletes records and leaves an audit trail
#[derive(Debug, Clone)]
pub struct RecordPurger {
    pool: SqlitePool,
    event_bus: EventBus,
    max_lock_wait_ms: u64,
}

impl RecordPurger {
    pub fn new(pool: SqlitePool, event_bus: EventBus, max_lock_wait_ms: u64) -> Self {
        Self {
            pool,
            event_bus,
            max_lock_wait_ms,
        }
    }

    /// Store the purger deletes from
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Bus the purger reports to
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Delete `candidates` in one transaction, returning rows removed
    pub async fn purge(&self, stage: &str, candidates: Vec<PurgeCandidate>) -> Result<u64> {
        if candidates.is_empty() {
            return Ok(0);
        }

        for candidate in &candidates {
            info!(
                id = %candidate.id,
                stage,
                reason = %candidate.reason,
                "Deleting record"
            );
            self.event_bus.emit_lossy(CurationEvent::RecordPurged {
                id: candidate.id.clone(),
                stage: stage.to_string(),
                reason: candidate.reason.clone(),
            });
        }

        let ids: Vec<String> = candidates.into_iter().map(|c| c.id).collect();
        let pool = &self.pool;
        let ids_ref = &ids;

        retry_on_lock(stage, self.max_lock_wait_ms, || async move {
            db::delete_records(pool, ids_ref).await
        })
        .await
    }
}
