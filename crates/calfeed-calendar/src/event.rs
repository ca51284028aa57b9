//! Events read from a calendar's event feed.

use crate::calendar::Calendar;
use crate::codec::{self, Binding, FieldMap, Slot};
use crate::error::CalendarError;
use crate::types::{EventStatus, EventTime};

#[derive(Debug, Clone, Copy)]
enum EventField {
    Id,
    Title,
    Content,
    Location,
    Status,
    Start,
    End,
    EditFeed,
}

const EVENT_BINDINGS: &[Binding<EventField>] = &[
    Binding::ro("id", Slot::Text, EventField::Id),
    Binding::ro("title", Slot::Text, EventField::Title),
    Binding::ro("content", Slot::Text, EventField::Content),
    Binding::ro("where", Slot::Attr("valueString"), EventField::Location),
    Binding::ro("eventStatus", Slot::Attr("value"), EventField::Status),
    Binding::ro("when", Slot::Attr("startTime"), EventField::Start),
    Binding::ro("when", Slot::Attr("endTime"), EventField::End),
    Binding::ro("link", Slot::Link("edit"), EventField::EditFeed),
];

/// Raw strings of an event entry before conversion.
#[derive(Debug, Default)]
struct EventEntry {
    id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    location: Option<String>,
    status: Option<String>,
    start: Option<String>,
    end: Option<String>,
    edit_feed: Option<String>,
}

impl FieldMap for EventEntry {
    type Field = EventField;

    fn get(&self, field: EventField) -> Option<String> {
        match field {
            EventField::Id => self.id.clone(),
            EventField::Title => self.title.clone(),
            EventField::Content => self.content.clone(),
            EventField::Location => self.location.clone(),
            EventField::Status => self.status.clone(),
            EventField::Start => self.start.clone(),
            EventField::End => self.end.clone(),
            EventField::EditFeed => self.edit_feed.clone(),
        }
    }

    fn set(&mut self, field: EventField, value: Option<String>) {
        match field {
            EventField::Id => self.id = value,
            EventField::Title => self.title = value,
            EventField::Content => self.content = value,
            EventField::Location => self.location = value.filter(|v| !v.is_empty()),
            EventField::Status => self.status = value,
            EventField::Start => self.start = value,
            EventField::End => self.end = value,
            EventField::EditFeed => self.edit_feed = value,
        }
    }
}

fn parse_time(value: Option<&str>) -> Result<Option<EventTime>, CalendarError> {
    value
        .map(|v| {
            EventTime::parse(v)
                .ok_or_else(|| CalendarError::InvalidEntry(format!("invalid event time: {}", v)))
        })
        .transpose()
}

/// A single event of a calendar.
#[derive(Debug, Clone)]
pub struct Event {
    calendar_id: Option<String>,
    id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    location: Option<String>,
    status: EventStatus,
    start: Option<EventTime>,
    end: Option<EventTime>,
    edit_feed: Option<String>,
    exists: bool,
}

impl Event {
    /// An empty event belonging to `calendar`.
    pub fn new(calendar: &Calendar) -> Self {
        Self {
            calendar_id: calendar.id().map(str::to_string),
            id: None,
            title: None,
            content: None,
            location: None,
            status: EventStatus::default(),
            start: None,
            end: None,
            edit_feed: None,
            exists: false,
        }
    }

    /// Populate the event from one standalone `entry` document.
    ///
    /// Fails on malformed XML, a root other than `entry`, a missing id or
    /// an unreadable `gd:when` time. The event is untouched on failure.
    pub fn load(&mut self, xml: &str) -> Result<(), CalendarError> {
        let root = codec::parse(xml)?;
        if root.name != "entry" {
            return Err(CalendarError::InvalidEntry(format!(
                "expected entry, found {}",
                root.name
            )));
        }

        let mut entry = EventEntry::default();
        codec::decode(&root, EVENT_BINDINGS, &mut entry);

        let id = entry
            .id
            .as_deref()
            .map(|id| id.trim().rsplit('/').next().unwrap_or(id).to_string())
            .ok_or_else(|| CalendarError::InvalidEntry("event entry has no id".to_string()))?;
        let start = parse_time(entry.start.as_deref())?;
        let end = parse_time(entry.end.as_deref())?;

        self.id = Some(id);
        self.title = entry.title;
        self.content = entry.content;
        self.location = entry.location;
        self.status = entry
            .status
            .as_deref()
            .map(EventStatus::from_wire)
            .unwrap_or_default();
        self.start = start;
        self.end = end;
        self.edit_feed = entry.edit_feed;
        self.exists = true;
        Ok(())
    }

    pub fn calendar_id(&self) -> Option<&str> {
        self.calendar_id.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    pub fn start(&self) -> Option<&EventTime> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&EventTime> {
        self.end.as_ref()
    }

    pub fn all_day(&self) -> bool {
        matches!(self.start, Some(EventTime::Date(_)))
    }

    pub fn edit_feed(&self) -> Option<&str> {
        self.edit_feed.as_deref()
    }

    pub fn exists(&self) -> bool {
        self.exists
    }
}
