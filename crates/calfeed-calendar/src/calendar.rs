//! The calendar entity and its lifecycle against the feed service.

use tracing::instrument;

use crate::acl;
use crate::codec::{self, parse_flag, Binding, FieldMap, Slot};
use crate::embed::{self, EmbedOptions};
use crate::error::CalendarError;
use crate::event::Event;
use crate::service::Service;
use crate::types::{CalendarAttributes, EventFeed, SkippedEntry};

/// Entry written for calendars that have never been loaded.
const CALENDAR_XML: &str = r#"<entry xmlns='http://www.w3.org/2005/Atom' xmlns:gd='http://schemas.google.com/g/2005' xmlns:gCal='http://schemas.google.com/gCal/2005'>
  <title type='text'></title>
  <summary type='text'></summary>
  <gCal:timezone value='America/Los_Angeles'></gCal:timezone>
  <gCal:hidden value='false'></gCal:hidden>
  <gCal:color value='#2952A3'></gCal:color>
  <gCal:selected value='true'></gCal:selected>
  <gd:where rel='' label='' valueString=''></gd:where>
</entry>"#;

/// Path segment preceding the bare id in a calendar's `<id>` URL.
const ID_PREFIX: &str = "/feeds/default/calendars/";

#[derive(Debug, Clone, Copy)]
enum CalendarField {
    Id,
    Title,
    Summary,
    Timezone,
    Color,
    Hidden,
    Selected,
    Location,
    EditFeed,
}

const CALENDAR_BINDINGS: &[Binding<CalendarField>] = &[
    Binding::ro("id", Slot::Text, CalendarField::Id),
    Binding::rw("title", Slot::Text, CalendarField::Title),
    Binding::rw("summary", Slot::Text, CalendarField::Summary),
    Binding::rw("timezone", Slot::Attr("value"), CalendarField::Timezone),
    Binding::rw("color", Slot::Attr("value"), CalendarField::Color),
    Binding::rw("hidden", Slot::Attr("value"), CalendarField::Hidden),
    Binding::rw("selected", Slot::Attr("value"), CalendarField::Selected),
    Binding::rw("where", Slot::Attr("valueString"), CalendarField::Location),
    Binding::ro("link", Slot::Link("edit"), CalendarField::EditFeed),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct CalendarData {
    id: Option<String>,
    title: Option<String>,
    summary: Option<String>,
    timezone: Option<String>,
    color: Option<String>,
    hidden: bool,
    selected: bool,
    location: Option<String>,
    edit_feed: Option<String>,
}

impl CalendarData {
    /// Field values of the new-calendar template.
    fn from_template() -> Self {
        let mut data = Self::default();
        if let Ok(root) = codec::parse(CALENDAR_XML) {
            codec::decode(&root, CALENDAR_BINDINGS, &mut data);
        }
        data
    }
}

impl FieldMap for CalendarData {
    type Field = CalendarField;

    fn get(&self, field: CalendarField) -> Option<String> {
        match field {
            CalendarField::Id => self.id.clone(),
            CalendarField::Title => self.title.clone(),
            CalendarField::Summary => self.summary.clone(),
            CalendarField::Timezone => self.timezone.clone(),
            CalendarField::Color => self.color.clone(),
            CalendarField::Hidden => Some(self.hidden.to_string()),
            CalendarField::Selected => Some(self.selected.to_string()),
            CalendarField::Location => self.location.clone(),
            CalendarField::EditFeed => self.edit_feed.clone(),
        }
    }

    fn set(&mut self, field: CalendarField, value: Option<String>) {
        match field {
            CalendarField::Id => self.id = value.map(|v| calendar_id_from_url(&v)),
            CalendarField::Title => self.title = value,
            CalendarField::Summary => self.summary = value,
            CalendarField::Timezone => self.timezone = value,
            CalendarField::Color => self.color = value,
            CalendarField::Hidden => self.hidden = parse_flag(value.as_deref()),
            CalendarField::Selected => self.selected = parse_flag(value.as_deref()),
            CalendarField::Location => self.location = value.filter(|v| !v.is_empty()),
            CalendarField::EditFeed => self.edit_feed = value,
        }
    }
}

/// Bare calendar id from the URL-shaped `<id>` text.
///
/// Falls back to the last path segment when the canonical prefix is absent.
pub(crate) fn calendar_id_from_url(text: &str) -> String {
    let text = text.trim();
    match text.find(ID_PREFIX) {
        Some(start) => text[start + ID_PREFIX.len()..].to_string(),
        None => text.rsplit('/').next().unwrap_or(text).to_string(),
    }
}

/// One calendar of the authenticated account.
///
/// Attribute setters only change local state; call [`Calendar::save`] to
/// write them. [`Calendar::set_public`] is the exception and writes at once.
#[derive(Debug, Clone)]
pub struct Calendar {
    service: Service,
    data: CalendarData,
    event_feed: Option<String>,
    public: bool,
    editable: bool,
    exists: bool,
    xml: String,
}

impl Calendar {
    /// A calendar that does not exist on the service yet.
    pub fn new(service: &Service) -> Self {
        Self {
            data: CalendarData::from_template(),
            ..Self::empty(service)
        }
    }

    pub fn with_attributes(service: &Service, attributes: CalendarAttributes) -> Self {
        let mut calendar = Self::new(service);
        calendar.apply(attributes);
        calendar
    }

    pub(crate) fn empty(service: &Service) -> Self {
        Self {
            service: service.clone(),
            data: CalendarData::default(),
            event_feed: None,
            public: false,
            editable: false,
            exists: false,
            xml: CALENDAR_XML.to_string(),
        }
    }

    /// Copy every attribute that is set onto this calendar.
    pub fn apply(&mut self, attributes: CalendarAttributes) {
        let CalendarAttributes {
            title,
            summary,
            timezone,
            color,
            hidden,
            selected,
            location,
        } = attributes;

        if let Some(title) = title {
            self.set_title(title);
        }
        if let Some(summary) = summary {
            self.set_summary(summary);
        }
        if let Some(timezone) = timezone {
            self.set_timezone(timezone);
        }
        if let Some(color) = color {
            self.set_color(color);
        }
        if let Some(hidden) = hidden {
            self.set_hidden(hidden);
        }
        if let Some(selected) = selected {
            self.set_selected(selected);
        }
        if let Some(location) = location {
            self.set_location(location);
        }
    }

    pub fn service(&self) -> &Service {
        &self.service
    }

    pub fn id(&self) -> Option<&str> {
        self.data.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.data.title.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.data.summary.as_deref()
    }

    pub fn timezone(&self) -> Option<&str> {
        self.data.timezone.as_deref()
    }

    pub fn color(&self) -> Option<&str> {
        self.data.color.as_deref()
    }

    pub fn is_hidden(&self) -> bool {
        self.data.hidden
    }

    pub fn is_selected(&self) -> bool {
        self.data.selected
    }

    /// Free-text location (`gd:where`).
    pub fn location(&self) -> Option<&str> {
        self.data.location.as_deref()
    }

    pub fn event_feed(&self) -> Option<&str> {
        self.event_feed.as_deref()
    }

    pub fn edit_feed(&self) -> Option<&str> {
        self.data.edit_feed.as_deref()
    }

    /// Whether the calendar was loaded from, or saved to, the service.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.data.title = Some(title.into());
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.data.summary = Some(summary.into());
    }

    pub fn set_timezone(&mut self, timezone: impl Into<String>) {
        self.data.timezone = Some(timezone.into());
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.data.color = Some(color.into());
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.data.hidden = hidden;
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.data.selected = selected;
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.data.location = Some(location.into()).filter(|l| !l.is_empty());
    }

    /// Populate the calendar from one entry returned by the service.
    ///
    /// When the service checks public status this also reads the ACL feed.
    /// An unreadable ACL feed marks the calendar private and read-only
    /// without failing the load. Nothing changes unless the load succeeds.
    #[instrument(skip(self, xml), level = "debug")]
    pub async fn load(&mut self, xml: &str) -> Result<(), CalendarError> {
        let root = codec::parse(xml)?;
        let mut data = self.data.clone();
        codec::decode(&root, CALENDAR_BINDINGS, &mut data);

        let id = data
            .id
            .clone()
            .ok_or_else(|| CalendarError::InvalidEntry("calendar entry has no id".to_string()))?;
        let (public, editable) = self.access_for(&id).await?;

        self.event_feed = Some(self.service.event_feed(&id));
        self.data = data;
        if let Some(public) = public {
            self.public = public;
        }
        self.editable = editable;
        self.exists = true;
        self.xml = xml.to_string();
        Ok(())
    }

    /// Public status (when the ACL names the default scope) and editability.
    async fn access_for(&self, id: &str) -> Result<(Option<bool>, bool), CalendarError> {
        if !self.service.check_public() {
            return Ok((Some(false), true));
        }

        let response = match self.service.send_get(&self.service.acl_feed(id)).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    calendar = id,
                    status = %response.status(),
                    "ACL feed unavailable, treating calendar as private"
                );
                return Ok((Some(false), false));
            }
            Err(e) => {
                tracing::warn!(calendar = id, error = %e, "ACL fetch failed, treating calendar as private");
                return Ok((Some(false), false));
            }
        };

        Ok((acl::default_scope_public(response.body())?, true))
    }

    /// Load every entry of a calendar feed.
    ///
    /// Entries that fail to load are logged and left out.
    pub(crate) async fn load_feed(service: &Service, body: &str) -> Result<Vec<Calendar>, CalendarError> {
        let mut calendars = Vec::new();
        for (index, mut entry) in codec::feed_entries(body)?.into_iter().enumerate() {
            codec::declare_entry_namespaces(&mut entry);
            let xml = codec::write_fragment(&entry)?;

            let mut calendar = Self::empty(service);
            match calendar.load(&xml).await {
                Ok(()) => calendars.push(calendar),
                Err(e) => tracing::warn!(index, error = %e, "skipping calendar entry"),
            }
        }
        Ok(calendars)
    }

    /// Entry XML carrying the current attribute values.
    ///
    /// Rewrites the last loaded entry (or the new-calendar template); elements
    /// the template lacks are not added.
    pub fn to_xml(&self) -> Result<String, CalendarError> {
        let mut root = codec::parse(&self.xml)?;
        codec::encode(&mut root, CALENDAR_BINDINGS, &self.data);
        codec::write_document(&root)
    }

    /// Fetch the calendar's events. Every call hits the service.
    ///
    /// Entries that fail to load are reported in [`EventFeed::skipped`].
    #[instrument(skip(self), level = "info")]
    pub async fn events(&self) -> Result<EventFeed, CalendarError> {
        let url = self.event_feed.as_deref().ok_or(CalendarError::MissingId)?;
        let response = self.service.send_get(url).await?.error_for_status()?;

        let mut feed = EventFeed::default();
        for (index, mut entry) in codec::feed_entries(response.body())?.into_iter().enumerate() {
            codec::declare_entry_namespaces(&mut entry);

            let mut event = Event::new(self);
            match codec::write_fragment(&entry).and_then(|xml| event.load(&xml)) {
                Ok(()) => feed.events.push(event),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping event entry");
                    feed.skipped.push(SkippedEntry {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(feed)
    }

    /// Grant (`true`) or revoke (`false`) public read access.
    ///
    /// Always issues the ACL write, even when the flag would not change.
    /// Returns `Ok(false)` if the service rejects the update.
    #[instrument(skip(self), level = "info")]
    pub async fn set_public(&mut self, public: bool) -> Result<bool, CalendarError> {
        let id = self.data.id.as_deref().ok_or(CalendarError::MissingId)?;
        let url = self.service.acl_default_url(id);
        let body = acl::default_rule(public)?;

        let response = self.service.send_put(&url, body).await?;
        if response.is_success() {
            self.public = public;
            Ok(true)
        } else {
            tracing::warn!(status = %response.status(), "ACL update rejected");
            Ok(false)
        }
    }

    /// Delete the calendar and clear this object.
    ///
    /// Returns `Ok(false)` without a request when the calendar does not exist.
    #[instrument(skip(self), level = "info")]
    pub async fn delete(&mut self) -> Result<bool, CalendarError> {
        let Some(id) = self.data.id.as_deref().filter(|_| self.exists) else {
            return Ok(false);
        };

        let response = self.service.send_delete(&self.service.calendar_url(id)).await?;
        if !response.is_success() {
            tracing::warn!(status = %response.status(), "calendar delete rejected");
            return Ok(false);
        }

        self.clear();
        Ok(true)
    }

    fn clear(&mut self) {
        self.data = CalendarData::default();
        self.event_feed = None;
        self.public = false;
        self.editable = false;
        self.exists = false;
        self.xml = CALENDAR_XML.to_string();
    }

    /// Create the calendar, or update it if it already exists.
    ///
    /// A rejected update is `Ok(false)`. A create whose response cannot be
    /// loaded is [`CalendarError::SaveFailed`].
    #[instrument(skip(self), level = "info")]
    pub async fn save(&mut self) -> Result<bool, CalendarError> {
        let body = self.to_xml()?;

        if self.exists {
            let Some(edit_feed) = self.data.edit_feed.as_deref() else {
                tracing::warn!("calendar has no edit link, cannot update");
                return Ok(false);
            };
            let response = self.service.send_put(edit_feed, body).await?;
            if !response.is_success() {
                tracing::warn!(status = %response.status(), "calendar update rejected");
            }
            return Ok(response.is_success());
        }

        let response = self.service.send_post(&self.service.calendars_feed(), body).await?;
        if !response.is_success() {
            return Err(CalendarError::SaveFailed(format!(
                "service returned {}",
                response.status()
            )));
        }

        self.load(response.body())
            .await
            .map_err(|e| CalendarError::SaveFailed(e.to_string()))?;
        tracing::info!(id = ?self.data.id, "calendar created");
        Ok(true)
    }

    /// Replace local state with the service's copy.
    ///
    /// `Ok(false)` if the calendar does not exist or is no longer listed.
    #[instrument(skip(self), level = "info")]
    pub async fn reload(&mut self) -> Result<bool, CalendarError> {
        let Some(id) = self.data.id.clone().filter(|_| self.exists) else {
            return Ok(false);
        };

        match Calendar::find_by_id(&self.service, &id).await? {
            Some(current) => {
                let xml = current.to_xml()?;
                self.load(&xml).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Iframe snippet embedding this calendar.
    pub fn to_iframe(&self, options: &EmbedOptions) -> Result<String, CalendarError> {
        let id = self.id().ok_or(CalendarError::MissingId)?;
        embed::iframe_at(&self.service.embed_url(), id, options)
    }
}
