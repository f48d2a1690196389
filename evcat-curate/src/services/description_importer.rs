//! Description-result import
//!
//! Applies externally produced description tiers to stored records. Input is
//! a manifest of `(id, location)` pairs; each location is a JSON document:
//!
//! ```json
//! { "full_description_en": "...", "full_description_gr": "..." }
//! ```
//!
//! The display tier (`full_description`) takes the English text when the
//! document does not carry one. Re-applying the same manifest leaves the
//! store unchanged apart from `updated_at`.

use evcat_common::db::{self, has_text, DescriptionUpdate};
use evcat_common::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One `(id, location)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionSource {
    pub id: String,
    pub location: PathBuf,
}

/// Outcome of one import pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptionImportReport {
    pub applied: u64,
    /// Ids with no stored record
    pub not_found: u64,
    /// Locations that could not be read or parsed
    pub failed: u64,
    /// Documents carrying no text in any tier
    pub empty: u64,
}

/// Read a manifest, resolving relative locations against its directory
pub fn load_manifest(path: &Path) -> Result<Vec<DescriptionSource>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::InvalidInput(format!("Failed to read manifest {}: {}", path.display(), e))
    })?;
    let mut sources: Vec<DescriptionSource> = serde_json::from_str(&content)?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    for source in &mut sources {
        if source.location.is_relative() {
            source.location = base.join(&source.location);
        }
    }

    Ok(sources)
}

/// Parse a result document and fill the display tier
pub fn parse_result(content: &str) -> Result<DescriptionUpdate> {
    let mut update: DescriptionUpdate = serde_json::from_str(content)?;
    if !has_text(&update.full_description) && has_text(&update.full_description_en) {
        update.full_description = update.full_description_en.clone();
    }
    Ok(update)
}

async fn read_result(location: &Path) -> Result<DescriptionUpdate> {
    let content = tokio::fs::read_to_string(location).await?;
    parse_result(&content)
}

/// Apply every source in order
///
/// Unreadable locations are counted and skipped; store failures abort.
pub async fn apply_description_results(
    pool: &SqlitePool,
    sources: &[DescriptionSource],
) -> Result<DescriptionImportReport> {
    let mut report = DescriptionImportReport::default();

    for source in sources {
        let update = match read_result(&source.location).await {
            Ok(update) => update,
            Err(e) => {
                warn!(
                    id = %source.id,
                    location = %source.location.display(),
                    error = %e,
                    "Skipping unreadable description result"
                );
                report.failed += 1;
                continue;
            }
        };

        if update.is_empty() {
            debug!(id = %source.id, "Description result carries no text");
            report.empty += 1;
            continue;
        }

        match db::apply_description_update(pool, &source.id, &update).await? {
            0 => {
                warn!(id = %source.id, "No stored record for description result");
                report.not_found += 1;
            }
            _ => {
                debug!(id = %source.id, "Description applied");
                report.applied += 1;
            }
        }
    }

    info!(
        applied = report.applied,
        not_found = report.not_found,
        failed = report.failed,
        empty = report.empty,
        "Description import complete"
    );

    Ok(report)
}
