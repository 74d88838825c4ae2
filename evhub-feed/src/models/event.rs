//! Unified event representation
//!
//! Every source (local store, remote catalog) is normalized into
//! [`UnifiedEvent`] before merging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used when a record arrives without one
pub const UNTITLED_EVENT: &str = "Untitled event";

/// Display date used when a record has no usable date
pub const DATE_TBA: &str = "Date TBA";

/// Where an event came from
///
/// Local records always take precedence over external ones on collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOrigin {
    Local,
    External,
}

/// Normalized event, independent of originating source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedEvent {
    pub id: String,
    pub title: String,
    pub cover_image: Option<String>,
    pub start_instant: Option<DateTime<Utc>>,
    pub display_date: String,
    pub display_time: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer_name: Option<String>,
    pub price: Option<f64>,
    pub is_free: Option<bool>,
    pub category: Option<String>,
    pub source_origin: SourceOrigin,
}

impl UnifiedEvent {
    /// Minimal event with the given id and title; everything else empty
    pub fn new(id: impl Into<String>, title: impl Into<String>, source_origin: SourceOrigin) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            cover_image: None,
            start_instant: None,
            display_date: DATE_TBA.to_string(),
            display_time: String::new(),
            location: None,
            description: None,
            organizer_name: None,
            price: None,
            is_free: None,
            category: None,
            source_origin,
        }
    }

    /// Set start instant and derive the display strings from it
    pub fn with_start(mut self, instant: DateTime<Utc>) -> Self {
        self.set_start(instant);
        self
    }

    pub fn set_start(&mut self, instant: DateTime<Utc>) {
        self.display_date = evhub_common::time::display_date(&instant);
        self.display_time = evhub_common::time::display_time(&instant);
        self.start_instant = Some(instant);
    }

    /// True if explicitly marked free
    pub fn is_free(&self) -> bool {
        self.is_free.unwrap_or(false)
    }
}

/// Raw row from the local event store
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct LocalEventRecord {
    pub id: String,
    pub title: Option<String>,
    pub cover_image: Option<String>,
    /// Calendar date as entered, e.g. "2026-10-25"
    pub date: Option<String>,
    /// Wall-clock time as entered, e.g. "20:00"
    pub time: Option<String>,
    /// RFC 3339 start, when the writer supplied one
    pub start_at: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer_name: Option<String>,
    pub price: Option<f64>,
    pub is_free: Option<bool>,
    pub category: Option<String>,
    /// Importer that created this record, if it was imported
    pub imported_from: Option<String>,
    pub created_at: String,
}

/// Fields for creating or replacing a local event
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewLocalEvent {
    pub title: Option<String>,
    pub cover_image: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub start_at: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub organizer_name: Option<String>,
    pub price: Option<f64>,
    pub is_free: Option<bool>,
    pub category: Option<String>,
    pub imported_from: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_source_origin_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SourceOrigin::Local).unwrap(), "\"local\"");
        assert_eq!(
            serde_json::to_string(&SourceOrigin::External).unwrap(),
            "\"external\""
        );
    }

    #[test]
    fn test_with_start_sets_display_strings() {
        let start = Utc.with_ymd_and_hms(2026, 10, 24, 20, 0, 0).unwrap();
        let event = UnifiedEvent::new("e1", "Show", SourceOrigin::External).with_start(start);
        assert_eq!(event.start_instant, Some(start));
        assert_eq!(event.display_date, "Sat, Oct 24");
        assert_eq!(event.display_time, "8:00 PM");
    }

    #[test]
    fn test_new_event_defaults() {
        let event = UnifiedEvent::new("e1", "Show", SourceOrigin::Local);
        assert_eq!(event.display_date, DATE_TBA);
        assert!(!event.is_free());
        assert!(event.cover_image.is_none());
    }
}
