//! Database models

use crate::time;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cultural-event record as persisted in the `events` table
///
/// Only `id` is guaranteed. A record missing `title`, `start_date` or
/// `venue_name` is invalid and eligible for purge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: String,
    pub title: Option<String>,
    pub start_date: Option<String>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub venue_neighborhood: Option<String>,
    pub venue_lat: Option<f64>,
    pub venue_lng: Option<f64>,
    pub venue_capacity: Option<i64>,
    /// Short summary tier
    pub description: Option<String>,
    /// Display tier shown by the front end
    pub full_description: Option<String>,
    pub full_description_en: Option<String>,
    pub full_description_gr: Option<String>,
    pub price_amount: Option<f64>,
    pub updated_at: Option<String>,
}

impl EventRecord {
    /// Calendar date of `start_date`, if present and parsable
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.start_date.as_deref().and_then(time::calendar_date)
    }

    /// True when `start_date` carries the midnight time-unknown sentinel
    pub fn has_unknown_time(&self) -> bool {
        self.start_date
            .as_deref()
            .map(time::has_unknown_time)
            .unwrap_or(false)
    }

    /// First critical field that is null or blank, if any
    pub fn missing_critical_field(&self) -> Option<&'static str> {
        if !has_text(&self.title) {
            Some("title")
        } else if !has_text(&self.start_date) {
            Some("start_date")
        } else if !has_text(&self.venue_name) {
            Some("venue_name")
        } else {
            None
        }
    }
}

/// True for `Some` with non-whitespace content
pub fn has_text(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}

/// Venue-master entry applied to every record at a venue
///
/// Absent fields leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueDetails {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub capacity: Option<i64>,
}

/// Description tiers produced by an external enrichment run
///
/// Absent tiers leave the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DescriptionUpdate {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub full_description: Option<String>,
    #[serde(default)]
    pub full_description_en: Option<String>,
    #[serde(default)]
    pub full_description_gr: Option<String>,
}

impl DescriptionUpdate {
    /// True when no tier carries text
    pub fn is_empty(&self) -> bool {
        !has_text(&self.description)
            && !has_text(&self.full_description)
            && !has_text(&self.full_description_en)
            && !has_text(&self.full_description_gr)
    }
}
