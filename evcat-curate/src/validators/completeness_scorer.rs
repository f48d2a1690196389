//! Completeness Scorer
//!
//! Maps an event record to a quality score. Used by duplicate resolution to
//! decide which of several records describing the same real event survives.
//!
//! # Scoring Algorithm
//! Weighted sum of independent signals:
//! - Greek long-form description (more than 100 characters): +100
//! - English or display long-form description (more than 100 characters): +50
//! - Short description present: +10
//! - Price present and above zero: +20
//! - Start time captured (no `00:00:00` sentinel): +100
//!
//! A recency bonus of `updated_at` epoch seconds / 1e9 is carried separately
//! and only breaks ties. It is roughly 1.8 in 2026 and grows without bound,
//! but stays below the smallest signal weight until the 2280s. Records whose
//! `updated_at` cannot be parsed get no bonus.

use evcat_common::db::has_text;
use evcat_common::{time, EventRecord};
use serde::Serialize;
use std::cmp::Ordering;

/// Weight for a Greek long-form description
pub const GREEK_DESCRIPTION_WEIGHT: u32 = 100;
/// Weight for an English or display long-form description
pub const LONG_DESCRIPTION_WEIGHT: u32 = 50;
/// Weight for a short summary description
pub const SHORT_DESCRIPTION_WEIGHT: u32 = 10;
/// Weight for a non-zero price
pub const PRICE_WEIGHT: u32 = 20;
/// Weight for a captured start time
pub const KNOWN_TIME_WEIGHT: u32 = 100;

/// Long-form tiers must exceed this many characters to count
pub const DEFAULT_MIN_LONG_FORM_CHARS: usize = 100;

/// Divisor applied to `updated_at` epoch seconds for the recency bonus
pub const RECENCY_DIVISOR: f64 = 1_000_000_000.0;

/// Score of one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CompletenessScore {
    /// Sum of the signal weights present
    pub points: u32,
    /// Recency tie-break
    pub recency_bonus: f64,
}

impl CompletenessScore {
    /// Points plus recency bonus
    pub fn total(&self) -> f64 {
        self.points as f64 + self.recency_bonus
    }

    /// Ordering by total score
    pub fn cmp_total(&self, other: &Self) -> Ordering {
        self.total().total_cmp(&other.total())
    }
}

/// Completeness Scorer
///
/// Pure: scoring never touches the store and never logs.
#[derive(Debug, Clone)]
pub struct CompletenessScorer {
    /// Minimum long-form length (exclusive) for the description signals
    min_long_form_chars: usize,
}

impl CompletenessScorer {
    /// Create scorer with the default long-form threshold
    pub fn new() -> Self {
        Self {
            min_long_form_chars: DEFAULT_MIN_LONG_FORM_CHARS,
        }
    }

    /// Create scorer with a custom long-form threshold
    pub fn with_min_long_form_chars(min_long_form_chars: usize) -> Self {
        Self { min_long_form_chars }
    }

    /// Score one record
    pub fn score(&self, record: &EventRecord) -> CompletenessScore {
        let mut points = 0;

        if self.is_long_form(&record.full_description_gr) {
            points += GREEK_DESCRIPTION_WEIGHT;
        }

        if self.is_long_form(&record.full_description_en)
            || self.is_long_form(&record.full_description)
        {
            points += LONG_DESCRIPTION_WEIGHT;
        }

        if has_text(&record.description) {
            points += SHORT_DESCRIPTION_WEIGHT;
        }

        if record.price_amount.map(|p| p > 0.0).unwrap_or(false) {
            points += PRICE_WEIGHT;
        }

        if has_text(&record.start_date) && !record.has_unknown_time() {
            points += KNOWN_TIME_WEIGHT;
        }

        CompletenessScore {
            points,
            recency_bonus: recency_bonus(record),
        }
    }

    fn is_long_form(&self, text: &Option<String>) -> bool {
        text.as_deref()
            .map(|t| t.trim().chars().count() > self.min_long_form_chars)
            .unwrap_or(false)
    }
}

impl Default for CompletenessScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn recency_bonus(record: &EventRecord) -> f64 {
    record
        .updated_at
        .as_deref()
        .and_then(time::parse_timestamp)
        .map(|ts| ts.timestamp() as f64 / RECENCY_DIVISOR)
        .unwrap_or(0.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text(ch: char) -> String {
        std::iter::repeat(ch).take(150).collect()
    }

    fn bare_record() -> EventRecord {
        EventRecord {
            id: "jazz-night-2030-07-02".to_string(),
            title: Some("Jazz Night".to_string()),
            start_date: Some("2030-07-02T00:00:00".to_string()),
            venue_name: Some("Half Note Jazz Club".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_bare_record_scores_zero() {
        let score = CompletenessScorer::new().score(&bare_record());
        assert_eq!(score.points, 0);
        assert_eq!(score.recency_bonus, 0.0);
        assert_eq!(score.total(), 0.0);
    }

    #[test]
    fn test_each_signal_adds_exactly_its_weight() {
        let scorer = CompletenessScorer::new();
        let base = scorer.score(&bare_record()).points;

        let mut greek = bare_record();
        greek.full_description_gr = Some(long_text('α'));
        assert_eq!(scorer.score(&greek).points - base, GREEK_DESCRIPTION_WEIGHT);

        let mut english = bare_record();
        english.full_description_en = Some(long_text('a'));
        assert_eq!(scorer.score(&english).points - base, LONG_DESCRIPTION_WEIGHT);

        let mut display = bare_record();
        display.full_description = Some(long_text('a'));
        assert_eq!(scorer.score(&display).points - base, LONG_DESCRIPTION_WEIGHT);

        let mut short = bare_record();
        short.description = Some("Smooth jazz evening".to_string());
        assert_eq!(scorer.score(&short).points - base, SHORT_DESCRIPTION_WEIGHT);

        let mut priced = bare_record();
        priced.price_amount = Some(15.0);
        assert_eq!(scorer.score(&priced).points - base, PRICE_WEIGHT);

        let mut timed = bare_record();
        timed.start_date = Some("2030-07-02T21:30:00+03:00".to_string());
        assert_eq!(scorer.score(&timed).points - base, KNOWN_TIME_WEIGHT);
    }

    #[test]
    fn test_english_and_display_count_once() {
        let mut record = bare_record();
        record.full_description_en = Some(long_text('a'));
        record.full_description = Some(long_text('b'));
        assert_eq!(CompletenessScorer::new().score(&record).points, LONG_DESCRIPTION_WEIGHT);
    }

    #[test]
    fn test_short_long_form_does_not_count() {
        let mut record = bare_record();
        record.full_description_gr = Some("Σύντομο κείμενο".to_string());
        record.full_description_en = Some("Too short".to_string());
        assert_eq!(CompletenessScorer::new().score(&record).points, 0);
    }

    #[test]
    fn test_long_form_threshold_counts_characters_not_bytes() {
        // 60 Greek characters are 120 bytes but only 60 characters
        let mut record = bare_record();
        record.full_description_gr = Some(std::iter::repeat('λ').take(60).collect());
        assert_eq!(CompletenessScorer::new().score(&record).points, 0);

        let scorer = CompletenessScorer::with_min_long_form_chars(50);
        assert_eq!(scorer.score(&record).points, GREEK_DESCRIPTION_WEIGHT);
    }

    #[test]
    fn test_zero_price_is_free_or_unknown() {
        let mut record = bare_record();
        record.price_amount = Some(0.0);
        assert_eq!(CompletenessScorer::new().score(&record).points, 0);
    }

    #[test]
    fn test_missing_start_date_earns_no_time_points() {
        let mut record = bare_record();
        record.start_date = None;
        assert_eq!(CompletenessScorer::new().score(&record).points, 0);
    }

    #[test]
    fn test_full_record_scores_all_signals() {
        let mut record = bare_record();
        record.full_description_gr = Some(long_text('α'));
        record.full_description_en = Some(long_text('a'));
        record.description = Some("Jazz".to_string());
        record.price_amount = Some(20.0);
        record.start_date = Some("2030-07-02T21:30:00".to_string());
        assert_eq!(CompletenessScorer::new().score(&record).points, 280);
    }

    #[test]
    fn test_recency_breaks_ties() {
        let scorer = CompletenessScorer::new();
        let mut older = bare_record();
        older.updated_at = Some("2025-10-31T10:00:00Z".to_string());
        let mut newer = bare_record();
        newer.updated_at = Some("2026-03-01 09:00:00".to_string());

        let older_score = scorer.score(&older);
        let newer_score = scorer.score(&newer);
        assert_eq!(older_score.points, newer_score.points);
        assert_eq!(newer_score.cmp_total(&older_score), Ordering::Greater);
        assert!(newer_score.recency_bonus < SHORT_DESCRIPTION_WEIGHT as f64);
    }

    #[test]
    fn test_unparsable_updated_at_gets_no_bonus() {
        let mut record = bare_record();
        record.updated_at = Some("last tuesday".to_string());
        assert_eq!(CompletenessScorer::new().score(&record).recency_bonus, 0.0);
    }
}
