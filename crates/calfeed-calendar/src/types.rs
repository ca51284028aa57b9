//! Value types shared by the calendar and event entities.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Attributes a new [`Calendar`](crate::Calendar) can be seeded with.
///
/// Unknown keys are rejected when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarAttributes {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub timezone: Option<String>,
    pub color: Option<String>,
    pub hidden: Option<bool>,
    pub selected: Option<bool>,
    #[serde(rename = "where")]
    pub location: Option<String>,
}

/// How many matches [`Calendar::find`](crate::Calendar::find) returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    /// Stop at the first match.
    First,
    #[default]
    All,
}

/// Event time - can be a specific datetime or an all-day date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventTime {
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
}

impl EventTime {
    /// Parse a `gd:when` timestamp: RFC 3339 or a bare `YYYY-MM-DD` date.
    pub fn parse(value: &str) -> Option<Self> {
        if value.contains('T') {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| EventTime::DateTime(dt.with_timezone(&Utc)))
        } else {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(EventTime::Date)
        }
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        match self {
            EventTime::DateTime(dt) => *dt,
            EventTime::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// Event status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

impl EventStatus {
    /// Map a `gd:eventStatus` value such as `...#event.canceled`.
    pub fn from_wire(value: &str) -> Self {
        match value.rsplit('.').next() {
            Some("tentative") => Self::Tentative,
            Some("canceled") | Some("cancelled") => Self::Cancelled,
            _ => Self::Confirmed,
        }
    }
}

/// An entry of the event feed that could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position of the entry within the feed.
    pub index: usize,
    pub reason: String,
}

/// Result of reading a calendar's event feed.
#[derive(Debug, Clone, Default)]
pub struct EventFeed {
    pub events: Vec<Event>,
    pub skipped: Vec<SkippedEntry>,
}

impl EventFeed {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

impl IntoIterator for EventFeed {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}
