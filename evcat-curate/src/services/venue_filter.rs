//! Venue Admissibility Filter
//!
//! Decides whether a record's location belongs to the target region. Rules
//! are versioned configuration data (see `rules/athens.toml`), so operators
//! can tighten them without a new binary.
//!
//! # Decision procedure (first match wins)
//! 1. Reject an empty venue name
//! 2. Reject a venue name containing a deny-listed venue (case-insensitive)
//! 3. Reject a venue name matching a deny pattern
//! 4. Reject a venue address matching a deny pattern
//! 5. Admit
//!
//! # Variants
//! - [`VenueFilter::filter_batch`]: partition candidates, keep input order
//! - [`VenueFilter::gate`]: single candidate, announces rejections
//! - [`VenueFilter::sweep_store`]: delete stored records the current rules reject

use crate::services::record_purger::{PurgeCandidate, RecordPurger};
use evcat_common::events::{CurationEvent, EventBus};
use evcat_common::{db, Error, EventRecord, Result};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Rule set shipped with the binary
pub const BUNDLED_RULES: &str = include_str!("../../rules/athens.toml");

/// Stage name used in audit logs for the corrective sweep
pub const SWEEP_STAGE: &str = "venue_sweep";

/// Versioned region rule document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRules {
    pub version: u32,
    pub region: String,
    #[serde(default)]
    pub deny_venues: Vec<String>,
    #[serde(default)]
    pub deny_patterns: Vec<String>,
}

impl RegionRules {
    /// Parse a rule document from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid region rules: {}", e)))
    }

    /// Load a rule document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read region rules {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// The rule set shipped with the binary
    pub fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_RULES)
    }
}

/// Why a location was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionRule {
    EmptyVenueName,
    DenyListedVenue { entry: String },
    DenyPatternInName { pattern: String },
    DenyPatternInAddress { pattern: String },
}

impl fmt::Display for RejectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionRule::EmptyVenueName => write!(f, "empty venue name"),
            RejectionRule::DenyListedVenue { entry } => write!(f, "deny-listed venue '{}'", entry),
            RejectionRule::DenyPatternInName { pattern } => {
                write!(f, "venue name matches /{}/", pattern)
            }
            RejectionRule::DenyPatternInAddress { pattern } => {
                write!(f, "venue address matches /{}/", pattern)
            }
        }
    }
}

/// Outcome of evaluating one location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admissibility {
    Admitted,
    Rejected(RejectionRule),
}

impl Admissibility {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admissibility::Admitted)
    }
}

/// Anything carrying a venue location
pub trait VenueLocated {
    fn venue_name(&self) -> Option<&str>;
    fn venue_address(&self) -> Option<&str>;

    /// Identifier used in rejection notices
    fn candidate_id(&self) -> Option<&str> {
        None
    }

    /// Title used in rejection notices
    fn candidate_title(&self) -> Option<&str> {
        None
    }
}

impl VenueLocated for EventRecord {
    fn venue_name(&self) -> Option<&str> {
        self.venue_name.as_deref()
    }

    fn venue_address(&self) -> Option<&str> {
        self.venue_address.as_deref()
    }

    fn candidate_id(&self) -> Option<&str> {
        Some(&self.id)
    }

    fn candidate_title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// Admitted candidates plus the number rejected
#[derive(Debug, Clone)]
pub struct BatchOutcome<T> {
    pub admitted: Vec<T>,
    pub rejected: usize,
}

struct DenyPattern {
    source: String,
    regex: Regex,
}

/// Compiled region rules
pub struct VenueFilter {
    region: String,
    version: u32,
    /// (entry as written, lowercased entry)
    deny_venues: Vec<(String, String)>,
    deny_patterns: Vec<DenyPattern>,
}

impl fmt::Debug for VenueFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueFilter")
            .field("region", &self.region)
            .field("version", &self.version)
            .field("deny_venues", &self.deny_venues.len())
            .field("deny_patterns", &self.deny_patterns.len())
            .finish()
    }
}

impl VenueFilter {
    /// Compile a rule document
    ///
    /// An invalid pattern fails the whole load; a partially applied rule set
    /// would admit records the operator meant to reject.
    pub fn from_rules(rules: &RegionRules) -> Result<Self> {
        let deny_venues = rules
            .deny_venues
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| (entry.clone(), entry.to_lowercase()))
            .collect();

        let deny_patterns = rules
            .deny_patterns
            .iter()
            .map(|source| {
                RegexBuilder::new(source)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| DenyPattern {
                        source: source.clone(),
                        regex,
                    })
                    .map_err(|e| Error::Rules(format!("pattern '{}': {}", source, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            region = %rules.region,
            version = rules.version,
            deny_venues = rules.deny_venues.len(),
            deny_patterns = rules.deny_patterns.len(),
            "Compiled region rules"
        );

        Ok(Self {
            region: rules.region.clone(),
            version: rules.version,
            deny_venues,
            deny_patterns,
        })
    }

    /// Filter compiled from the bundled rule set
    pub fn bundled() -> Result<Self> {
        Self::from_rules(&RegionRules::bundled()?)
    }

    /// Filter from an operator rule file, or the bundled set when none is given
    pub fn load_or_bundled(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                info!(rules = %path.display(), "Loading region rules");
                Self::from_rules(&RegionRules::load(path)?)
            }
            None => Self::bundled(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Evaluate one location
    pub fn evaluate(&self, venue_name: Option<&str>, venue_address: Option<&str>) -> Admissibility {
        let name = match venue_name.map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Admissibility::Rejected(RejectionRule::EmptyVenueName),
        };

        let lowered = name.to_lowercase();
        if let Some((entry, _)) = self
            .deny_venues
            .iter()
            .find(|(_, needle)| lowered.contains(needle.as_str()))
        {
            return Admissibility::Rejected(RejectionRule::DenyListedVenue {
                entry: entry.clone(),
            });
        }

        if let Some(pattern) = self.matching_pattern(name) {
            return Admissibility::Rejected(RejectionRule::DenyPatternInName { pattern });
        }

        if let Some(address) = venue_address.filter(|a| !a.trim().is_empty()) {
            if let Some(pattern) = self.matching_pattern(address) {
                return Admissibility::Rejected(RejectionRule::DenyPatternInAddress { pattern });
            }
        }

        Admissibility::Admitted
    }

    /// Boolean form of [`evaluate`](Self::evaluate)
    pub fn is_admissible(&self, venue_name: Option<&str>, venue_address: Option<&str>) -> bool {
        self.evaluate(venue_name, venue_address).is_admitted()
    }

    fn matching_pattern(&self, text: &str) -> Option<String> {
        self.deny_patterns
            .iter()
            .find(|p| p.regex.is_match(text))
            .map(|p| p.source.clone())
    }

    /// Keep admissible candidates in input order, count the rest
    pub fn filter_batch<T: VenueLocated>(&self, candidates: Vec<T>) -> BatchOutcome<T> {
        let total = candidates.len();
        let admitted: Vec<T> = candidates
            .into_iter()
            .filter(|c| self.is_admissible(c.venue_name(), c.venue_address()))
            .collect();
        let rejected = total - admitted.len();

        if rejected > 0 {
            info!(
                region = %self.region,
                admitted = admitted.len(),
                rejected,
                "Venue filtering rejected out-of-region candidates"
            );
        }

        BatchOutcome { admitted, rejected }
    }

    /// Ingestion-time gate: evaluate and announce a rejection
    pub fn gate<T: VenueLocated>(&self, candidate: &T, event_bus: &EventBus) -> bool {
        match self.evaluate(candidate.venue_name(), candidate.venue_address()) {
            Admissibility::Admitted => true,
            Admissibility::Rejected(rule) => {
                warn!(
                    id = candidate.candidate_id().unwrap_or("-"),
                    title = candidate.candidate_title().unwrap_or("Untitled"),
                    venue = candidate.venue_name().unwrap_or(""),
                    rule = %rule,
                    "Rejected candidate outside {}",
                    self.region
                );
                event_bus.emit_lossy(CurationEvent::CandidateRejected {
                    id: candidate.candidate_id().map(str::to_string),
                    title: candidate.candidate_title().map(str::to_string),
                    venue_name: candidate.venue_name().map(str::to_string),
                    rule: rule.to_string(),
                });
                false
            }
        }
    }

    /// Corrective pass: delete stored records the current rules reject
    ///
    /// Returns the number of records removed.
    pub async fn sweep_store(&self, purger: &RecordPurger) -> Result<u64> {
        let records = db::fetch_all_records(purger.pool()).await?;
        let scanned = records.len();

        let candidates: Vec<PurgeCandidate> = records
            .iter()
            .filter_map(|record| match self.evaluate(record.venue_name(), record.venue_address()) {
                Admissibility::Admitted => None,
                Admissibility::Rejected(rule) => Some(PurgeCandidate::new(
                    record.id.clone(),
                    format!("outside {}: {}", self.region, rule),
                )),
            })
            .collect();

        let removed = purger.purge(SWEEP_STAGE, candidates).await?;

        info!(
            region = %self.region,
            rules_version = self.version,
            scanned,
            removed,
            "Venue sweep complete"
        );

        Ok(removed)
    }
}
