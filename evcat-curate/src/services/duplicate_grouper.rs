//! Duplicate Grouper
//!
//! Independent ingestion runs routinely store several records for the same
//! real event. Records sharing the exact title string and the calendar date of
//! `start_date` form a group; the best-scoring member is kept and the rest are
//! reported for deletion.
//!
//! Titles are compared byte-for-byte. Near-duplicates that differ in case,
//! punctuation or whitespace stay in separate groups.

use crate::validators::{CompletenessScore, CompletenessScorer};
use chrono::NaiveDate;
use evcat_common::db::has_text;
use evcat_common::EventRecord;
use std::collections::BTreeMap;

/// Record paired with its completeness score
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: EventRecord,
    pub score: CompletenessScore,
}

/// Records sharing `(title, calendar date)`, ranked by score
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub title: String,
    pub date: NaiveDate,
    /// Highest-scoring member
    pub keeper: ScoredRecord,
    /// Every other member, best first
    pub losers: Vec<ScoredRecord>,
}

impl DuplicateGroup {
    /// Ids of the members to delete
    pub fn loser_ids(&self) -> Vec<String> {
        self.losers.iter().map(|s| s.record.id.clone()).collect()
    }

    /// Number of members including the keeper
    pub fn member_count(&self) -> usize {
        self.losers.len() + 1
    }
}

/// Result of grouping a record set
#[derive(Debug, Clone, Default)]
pub struct GroupingOutcome {
    /// Groups with two or more members, largest first
    pub groups: Vec<DuplicateGroup>,
    /// Ids whose `start_date` could not be read as a date
    pub malformed_ids: Vec<String>,
}

impl GroupingOutcome {
    /// Every loser id across all groups
    pub fn loser_ids(&self) -> Vec<String> {
        self.groups.iter().flat_map(|g| g.loser_ids()).collect()
    }
}

/// Duplicate Grouper
#[derive(Debug, Clone, Default)]
pub struct DuplicateGrouper {
    scorer: CompletenessScorer,
}

impl DuplicateGrouper {
    /// Create grouper ranking members with `scorer`
    pub fn new(scorer: CompletenessScorer) -> Self {
        Self { scorer }
    }

    /// Partition `records` into duplicate groups
    ///
    /// Records without a title or start date are left out; they belong to the
    /// missing-field purge. Records whose start date has no readable calendar
    /// date are left out and reported in `malformed_ids`.
    ///
    /// Within a group members are sorted by descending score. The sort is
    /// stable, so exact score ties keep the input order.
    pub fn group_duplicates(&self, records: Vec<EventRecord>) -> GroupingOutcome {
        let mut buckets: BTreeMap<(String, NaiveDate), Vec<EventRecord>> = BTreeMap::new();
        let mut malformed_ids = Vec::new();

        for record in records {
            if !has_text(&record.title) || !has_text(&record.start_date) {
                continue;
            }
            let Some(date) = record.calendar_date() else {
                malformed_ids.push(record.id.clone());
                continue;
            };
            let title = record.title.clone().unwrap_or_default();
            buckets.entry((title, date)).or_default().push(record);
        }

        let mut groups: Vec<DuplicateGroup> = buckets
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .filter_map(|((title, date), members)| self.rank(title, date, members))
            .collect();

        // Largest groups first; BTreeMap order settles equal sizes
        groups.sort_by(|a, b| b.member_count().cmp(&a.member_count()));

        GroupingOutcome {
            groups,
            malformed_ids,
        }
    }

    fn rank(&self, title: String, date: NaiveDate, members: Vec<EventRecord>) -> Option<DuplicateGroup> {
        let mut scored: Vec<ScoredRecord> = members
            .into_iter()
            .map(|record| {
                let score = self.scorer.score(&record);
                ScoredRecord { record, score }
            })
            .collect();

        scored.sort_by(|a, b| b.score.cmp_total(&a.score));

        let mut ranked = scored.into_iter();
        let keeper = ranked.next()?;
        Some(DuplicateGroup {
            title,
            date,
            keeper,
            losers: ranked.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, start: &str) -> EventRecord {
        EventRecord {
            id: id.to_string(),
            title: Some(title.to_string()),
            start_date: Some(start.to_string()),
            venue_name: Some("Gazarte".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_singletons_are_not_duplicates() {
        let outcome = DuplicateGrouper::default().group_duplicates(vec![
            record("a", "Jazz Night", "2030-07-02T21:00:00"),
            record("b", "Jazz Night", "2030-07-03T21:00:00"),
            record("c", "Rock Night", "2030-07-02T21:00:00"),
        ]);
        assert!(outcome.groups.is_empty());
        assert!(outcome.loser_ids().is_empty());
    }

    #[test]
    fn test_time_of_day_is_ignored() {
        let outcome = DuplicateGrouper::default().group_duplicates(vec![
            record("a", "Jazz Night", "2030-07-02T00:00:00"),
            record("b", "Jazz Night", "2030-07-02T21:30:00+03:00"),
        ]);
        assert_eq!(outcome.groups.len(), 1);
        let group = &outcome.groups[0];
        assert_eq!(group.date, NaiveDate::from_ymd_opt(2030, 7, 2).unwrap());
        // The member with a real time outscores the midnight sentinel
        assert_eq!(group.keeper.record.id, "b");
        assert_eq!(group.loser_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn test_keeper_is_highest_score() {
        let mut rich = record("rich", "Jazz Night", "2030-07-02T21:00:00");
        rich.full_description_gr = Some("α".repeat(120));
        rich.description = Some("Τζαζ".to_string());
        let mut priced = record("priced", "Jazz Night", "2030-07-02T21:00:00");
        priced.price_amount = Some(15.0);
        let plain = record("plain", "Jazz Night", "2030-07-02T21:00:00");

        let outcome = DuplicateGrouper::default().group_duplicates(vec![plain, priced, rich]);
        let group = &outcome.groups[0];
        assert_eq!(group.member_count(), 3);
        assert_eq!(group.keeper.record.id, "rich");
        assert_eq!(group.keeper.score.points, 210);
        assert_eq!(group.loser_ids(), vec!["priced".to_string(), "plain".to_string()]);
    }

    #[test]
    fn test_exact_ties_keep_input_order() {
        let outcome = DuplicateGrouper::default().group_duplicates(vec![
            record("first", "Jazz Night", "2030-07-02T21:00:00"),
            record("second", "Jazz Night", "2030-07-02T21:00:00"),
        ]);
        assert_eq!(outcome.groups[0].keeper.record.id, "first");
    }

    #[test]
    fn test_recency_breaks_score_ties() {
        let mut older = record("older", "Jazz Night", "2030-07-02T21:00:00");
        older.updated_at = Some("2025-01-01 00:00:00".to_string());
        let mut newer = record("newer", "Jazz Night", "2030-07-02T21:00:00");
        newer.updated_at = Some("2026-01-01 00:00:00".to_string());

        let outcome = DuplicateGrouper::default().group_duplicates(vec![older, newer]);
        assert_eq!(outcome.groups[0].keeper.record.id, "newer");
    }

    #[test]
    fn test_near_duplicate_titles_are_not_merged() {
        let outcome = DuplicateGrouper::default().group_duplicates(vec![
            record("a", "Jazz Night", "2030-07-02T21:00:00"),
            record("b", "JAZZ NIGHT", "2030-07-02T21:00:00"),
            record("c", "Jazz Night!", "2030-07-02T21:00:00"),
            record("d", "Jazz  Night", "2030-07-02T21:00:00"),
        ]);
        assert!(outcome.groups.is_empty());
    }

    #[test]
    fn test_malformed_and_incomplete_records_are_left_out() {
        let mut untitled = record("untitled", "", "2030-07-02T21:00:00");
        untitled.title = None;
        let outcome = DuplicateGrouper::default().group_duplicates(vec![
            record("garbage-1", "Jazz Night", "soon"),
            record("garbage-2", "Jazz Night", "soon"),
            untitled.clone(),
            EventRecord {
                id: "untitled-2".to_string(),
                ..untitled
            },
        ]);
        assert!(outcome.groups.is_empty());
        assert_eq!(
            outcome.malformed_ids,
            vec!["garbage-1".to_string(), "garbage-2".to_string()]
        );
    }

    #[test]
    fn test_largest_groups_first() {
        let outcome = DuplicateGrouper::default().group_duplicates(vec![
            record("a1", "A", "2030-07-02T21:00:00"),
            record("a2", "A", "2030-07-02T21:00:00"),
            record("b1", "B", "2030-07-02T21:00:00"),
            record("b2", "B", "2030-07-02T21:00:00"),
            record("b3", "B", "2030-07-02T21:00:00"),
        ]);
        assert_eq!(outcome.groups.len(), 2);
        assert_eq!(outcome.groups[0].title, "B");
        assert_eq!(outcome.groups[1].title, "A");
        assert_eq!(outcome.loser_ids().len(), 3);
    }
}
