//! Cleanup pipeline
//!
//! Runs the five cleanup stages strictly in order. Cancellation is checked
//! between stages only; a stage that has started always finishes.

use super::{CleanupReport, CleanupStage, StageOutcome};
use crate::services::duplicate_grouper::DuplicateGrouper;
use crate::services::record_purger::{PurgeCandidate, RecordPurger};
use crate::utils::retry_on_lock;
use chrono::NaiveDate;
use evcat_common::db;
use evcat_common::events::{CurationEvent, EventBus};
use evcat_common::{time, Result};
use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default bound on lock-contention retries
pub const DEFAULT_MAX_LOCK_WAIT_MS: u64 = 5000;

/// Cascading Cleanup Orchestrator
pub struct CleanupPipeline {
    pool: SqlitePool,
    event_bus: EventBus,
    purger: RecordPurger,
    grouper: DuplicateGrouper,
    max_lock_wait_ms: u64,
}

impl CleanupPipeline {
    pub fn new(pool: SqlitePool, event_bus: EventBus) -> Self {
        Self {
            purger: RecordPurger::new(pool.clone(), event_bus.clone(), DEFAULT_MAX_LOCK_WAIT_MS),
            pool,
            event_bus,
            grouper: DuplicateGrouper::default(),
            max_lock_wait_ms: DEFAULT_MAX_LOCK_WAIT_MS,
        }
    }

    /// Bound lock-contention retries for destructive statements
    pub fn with_max_lock_wait(mut self, max_lock_wait_ms: u64) -> Self {
        self.max_lock_wait_ms = max_lock_wait_ms;
        self.purger = RecordPurger::new(self.pool.clone(), self.event_bus.clone(), max_lock_wait_ms);
        self
    }

    /// Replace the grouper used by duplicate resolution
    pub fn with_grouper(mut self, grouper: DuplicateGrouper) -> Self {
        self.grouper = grouper;
        self
    }

    /// Run every stage in order against the store
    ///
    /// A stage failure aborts the run with the error. Cancellation observed
    /// between stages ends the run early with `cancelled_before` set.
    pub async fn run(&self, today: NaiveDate, cancel_token: &CancellationToken) -> Result<CleanupReport> {
        info!(%today, "Starting cleanup pipeline");

        let mut stages = Vec::with_capacity(CleanupStage::ALL.len());
        let mut cancelled_before = None;

        for stage in CleanupStage::ALL {
            if cancel_token.is_cancelled() {
                warn!(before_stage = stage.name(), "Cleanup cancelled");
                self.event_bus.emit_lossy(CurationEvent::PipelineCancelled {
                    before_stage: stage.name().to_string(),
                    timestamp: time::now(),
                });
                cancelled_before = Some(stage);
                break;
            }

            self.event_bus.emit_lossy(CurationEvent::StageStarted {
                stage: stage.name().to_string(),
                timestamp: time::now(),
            });

            let outcome = self.run_stage(stage, today).await?;

            info!(
                stage = stage.name(),
                removed = outcome.removed,
                skipped_malformed = outcome.skipped_malformed,
                "{} complete",
                stage.label()
            );
            self.event_bus.emit_lossy(CurationEvent::StageCompleted {
                stage: stage.name().to_string(),
                removed: outcome.removed,
                skipped_malformed: outcome.skipped_malformed,
            });

            stages.push(outcome);
        }

        let total_removed = stages.iter().map(|s| s.removed).sum();
        let remaining = db::count_records(&self.pool).await?;
        let upcoming = db::count_upcoming(&self.pool, today).await?;

        if cancelled_before.is_none() {
            info!(total_removed, remaining, upcoming, "Cleanup pipeline complete");
            self.event_bus.emit_lossy(CurationEvent::PipelineCompleted {
                total_removed,
                remaining,
                upcoming,
                timestamp: time::now(),
            });
        }

        Ok(CleanupReport {
            today,
            stages,
            total_removed,
            remaining,
            upcoming,
            cancelled_before,
        })
    }

    /// Run a single stage
    pub async fn run_stage(&self, stage: CleanupStage, today: NaiveDate) -> Result<StageOutcome> {
        match stage {
            CleanupStage::PastEvents => self.purge_past_events(today).await,
            CleanupStage::UnknownTimes => self.purge_unknown_times().await,
            CleanupStage::Duplicates => self.resolve_duplicates().await,
            CleanupStage::MissingFields => self.purge_missing_fields().await,
            CleanupStage::StorageReclaim => self.reclaim_storage().await,
        }
    }

    /// Stage 1: delete records whose calendar date is before `today`
    ///
    /// Records without a start date are left to the missing-field purge.
    pub async fn purge_past_events(&self, today: NaiveDate) -> Result<StageOutcome> {
        let stage = CleanupStage::PastEvents;
        let records = db::fetch_all_records(&self.pool).await?;

        let mut candidates = Vec::new();
        let mut skipped = 0u64;

        for record in records {
            let Some(start_date) = record.start_date.as_deref().filter(|s| !s.trim().is_empty()) else {
                continue;
            };
            match time::calendar_date(start_date) {
                Some(date) if date < today => candidates.push(PurgeCandidate::new(
                    record.id,
                    format!("dated {} before {}", date, today),
                )),
                Some(_) => {}
                None => {
                    warn!(id = %record.id, start_date, stage = stage.name(), "Unreadable start date, skipping");
                    skipped += 1;
                }
            }
        }

        let removed = self.purger.purge(stage.name(), candidates).await?;
        Ok(StageOutcome::new(stage, removed).with_skipped(skipped))
    }

    /// Stage 2: delete records whose time component is the midnight sentinel
    ///
    /// A genuine midnight event is indistinguishable from a missing time and
    /// is removed as well.
    pub async fn purge_unknown_times(&self) -> Result<StageOutcome> {
        let stage = CleanupStage::UnknownTimes;
        let records = db::fetch_all_records(&self.pool).await?;

        let candidates: Vec<PurgeCandidate> = records
            .into_iter()
            .filter(|record| record.has_unknown_time())
            .map(|record| {
                let reason = format!(
                    "start date {} carries time-unknown sentinel",
                    record.start_date.as_deref().unwrap_or_default()
                );
                PurgeCandidate::new(record.id, reason)
            })
            .collect();

        let removed = self.purger.purge(stage.name(), candidates).await?;
        Ok(StageOutcome::new(stage, removed))
    }

    /// Stage 3: keep the best-scoring record of each duplicate group
    pub async fn resolve_duplicates(&self) -> Result<StageOutcome> {
        let stage = CleanupStage::Duplicates;
        let records = db::fetch_all_records(&self.pool).await?;
        let outcome = self.grouper.group_duplicates(records);

        for id in &outcome.malformed_ids {
            warn!(id = %id, stage = stage.name(), "Unreadable start date, skipping");
        }

        let mut candidates = Vec::new();
        for group in &outcome.groups {
            let keeper_total = group.keeper.score.total();
            info!(
                title = %group.title,
                date = %group.date,
                keeper = %group.keeper.record.id,
                keeper_score = keeper_total,
                members = group.member_count(),
                "Resolving duplicate group"
            );

            for loser in &group.losers {
                candidates.push(PurgeCandidate::new(
                    loser.record.id.clone(),
                    format!(
                        "duplicate of {} (score {:.3} < {:.3})",
                        group.keeper.record.id,
                        loser.score.total(),
                        keeper_total
                    ),
                ));
            }

            self.event_bus.emit_lossy(CurationEvent::DuplicateResolved {
                title: group.title.clone(),
                date: group.date.to_string(),
                keeper_id: group.keeper.record.id.clone(),
                keeper_score: keeper_total,
                removed_ids: group.loser_ids(),
            });
        }

        let removed = self.purger.purge(stage.name(), candidates).await?;
        Ok(StageOutcome::new(stage, removed).with_skipped(outcome.malformed_ids.len() as u64))
    }

    /// Stage 4: delete records missing title, start date or venue name
    pub async fn purge_missing_fields(&self) -> Result<StageOutcome> {
        let stage = CleanupStage::MissingFields;
        let candidates: Vec<PurgeCandidate> = db::fetch_missing_critical(&self.pool)
            .await?
            .into_iter()
            .map(|(id, field)| PurgeCandidate::new(id, format!("missing {}", field)))
            .collect();

        let removed = self.purger.purge(stage.name(), candidates).await?;
        Ok(StageOutcome::new(stage, removed))
    }

    /// Stage 5: compact the store
    pub async fn reclaim_storage(&self) -> Result<StageOutcome> {
        let stage = CleanupStage::StorageReclaim;
        let pool = &self.pool;
        retry_on_lock(stage.name(), self.max_lock_wait_ms, || async move {
            db::compact(pool).await
        })
        .await?;
        Ok(StageOutcome::new(stage, 0))
    }
}
