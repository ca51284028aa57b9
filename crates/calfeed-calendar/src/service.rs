//! The authenticated handle every calendar operation goes through.

use calfeed_core::ServiceConfig;
use tracing::instrument;

use crate::calendar::Calendar;
use crate::client::{FeedClient, FeedResponse};
use crate::error::CalendarError;

/// Feed client plus the settings that shape its requests.
///
/// Cloning is cheap; each [`Calendar`] keeps its own clone.
#[derive(Debug, Clone)]
pub struct Service {
    client: FeedClient,
    config: ServiceConfig,
}

impl Service {
    pub fn new(config: ServiceConfig, auth_token: &str) -> Self {
        Self::with_client(config, FeedClient::new(auth_token))
    }

    pub fn with_client(config: ServiceConfig, client: FeedClient) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Whether loading a calendar also reads its ACL feed.
    pub fn check_public(&self) -> bool {
        self.config.check_public
    }

    /// Feed of calendars owned by the account; also the creation endpoint.
    pub fn calendars_feed(&self) -> String {
        format!("{}/feeds/default/owncalendars/full", self.config.base())
    }

    pub fn calendar_url(&self, id: &str) -> String {
        format!("{}/{}", self.calendars_feed(), id)
    }

    /// Feed of every calendar the account can see, owned or subscribed.
    pub fn all_calendars_feed(&self) -> String {
        format!("{}/feeds/default/allcalendars/full", self.config.base())
    }

    pub fn event_feed(&self, id: &str) -> String {
        format!("{}/feeds/{}/private/full", self.config.base(), id)
    }

    pub fn acl_feed(&self, id: &str) -> String {
        format!("{}/feeds/{}/acl/full", self.config.base(), id)
    }

    /// ACL rule for the default (everyone) scope.
    pub fn acl_default_url(&self, id: &str) -> String {
        format!("{}/default", self.acl_feed(id))
    }

    pub fn embed_url(&self) -> String {
        format!("{}/embed", self.config.base())
    }

    pub async fn send_get(&self, url: &str) -> Result<FeedResponse, CalendarError> {
        self.client.get(url).await
    }

    pub async fn send_post(&self, url: &str, body: String) -> Result<FeedResponse, CalendarError> {
        self.client.post(url, body).await
    }

    pub async fn send_put(&self, url: &str, body: String) -> Result<FeedResponse, CalendarError> {
        self.client.put(url, body).await
    }

    pub async fn send_delete(&self, url: &str) -> Result<FeedResponse, CalendarError> {
        self.client.delete(url).await
    }

    /// All calendars owned by the account, each fully loaded.
    #[instrument(skip(self), level = "info")]
    pub async fn calendars(&self) -> Result<Vec<Calendar>, CalendarError> {
        let response = self.send_get(&self.calendars_feed()).await?.error_for_status()?;
        let calendars = Calendar::load_feed(self, response.body()).await?;
        tracing::debug!(count = calendars.len(), "listed calendars");
        Ok(calendars)
    }
}
