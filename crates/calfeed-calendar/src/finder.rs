//! Looking calendars up by id, title or summary.

use reqwest::StatusCode;
use tracing::instrument;

use crate::calendar::Calendar;
use crate::error::CalendarError;
use crate::service::Service;
use crate::types::Scope;

/// Pick the calendars matching `query` out of `candidates`.
///
/// An exact id match wins immediately whatever the scope. Otherwise title
/// and summary are matched case-insensitively by substring; no query matches
/// everything.
pub(crate) fn select(candidates: Vec<Calendar>, query: Option<&str>, scope: Scope) -> Vec<Calendar> {
    let needle = query.map(str::to_lowercase);
    let mut matches = Vec::new();

    for calendar in candidates {
        if query.is_some() && calendar.id() == query {
            return vec![calendar];
        }

        let hit = match &needle {
            Some(needle) => {
                let title = calendar.title().unwrap_or_default().to_lowercase();
                let summary = calendar.summary().unwrap_or_default().to_lowercase();
                title.contains(needle.as_str()) || summary.contains(needle.as_str())
            }
            None => true,
        };

        if hit {
            if scope == Scope::First {
                return vec![calendar];
            }
            matches.push(calendar);
        }
    }

    matches
}

impl Calendar {
    /// Search the account's calendars.
    ///
    /// Makes one listing request. [`Scope::First`] returns at most one
    /// calendar; [`Scope::All`] returns every match, possibly none.
    #[instrument(skip(service), level = "info")]
    pub async fn find(
        service: &Service,
        query: Option<&str>,
        scope: Scope,
    ) -> Result<Vec<Calendar>, CalendarError> {
        let calendars = service.calendars().await?;
        Ok(select(calendars, query, scope))
    }

    /// First calendar matching `query`, if any.
    pub async fn find_first(
        service: &Service,
        query: &str,
    ) -> Result<Option<Calendar>, CalendarError> {
        Ok(Self::find(service, Some(query), Scope::First)
            .await?
            .into_iter()
            .next())
    }

    /// The calendar whose id is exactly `id`.
    #[instrument(skip(service), level = "debug")]
    pub async fn find_by_id(service: &Service, id: &str) -> Result<Option<Calendar>, CalendarError> {
        let calendars = service.calendars().await?;
        Ok(calendars.into_iter().find(|c| c.id() == Some(id)))
    }

    /// Fetch one calendar from the all-calendars feed. `Ok(None)` on 404.
    #[instrument(skip(service), level = "info")]
    pub async fn get(service: &Service, id: &str) -> Result<Option<Calendar>, CalendarError> {
        let url = format!("{}/{}", service.all_calendars_feed(), id);
        let response = service.send_get(&url).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;

        let mut calendar = Calendar::empty(service);
        calendar.load(response.body()).await?;
        Ok(Some(calendar))
    }

    /// Server-side full-text search over every calendar the account can see.
    #[instrument(skip(service), level = "info")]
    pub async fn query(service: &Service, term: &str) -> Result<Vec<Calendar>, CalendarError> {
        let url = format!(
            "{}?q={}",
            service.all_calendars_feed(),
            urlencoding::encode(term)
        );
        let response = service.send_get(&url).await?.error_for_status()?;
        Calendar::load_feed(service, response.body()).await
    }
}
