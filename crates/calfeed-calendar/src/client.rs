//! Authenticated HTTP transport for the calendar feeds.

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{RequestBuilder, StatusCode};
use tracing::instrument;

use crate::error::CalendarError;

/// Content type sent with every write.
pub const ATOM_CONTENT_TYPE: &str = "application/atom+xml";

#[derive(Clone)]
pub struct FeedClient {
    client: reqwest::Client,
    auth_token: Option<String>,
}

impl std::fmt::Debug for FeedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedClient")
            .field("authenticated", &self.auth_token.is_some())
            .finish()
    }
}

impl FeedClient {
    pub fn new(auth_token: &str) -> Self {
        Self::with_client(reqwest::Client::new(), Some(auth_token.to_string()))
    }

    /// A client that sends no credentials; only public feeds will answer.
    pub fn anonymous() -> Self {
        Self::with_client(reqwest::Client::new(), None)
    }

    /// Wrap an already configured reqwest client (proxies, timeouts, default headers).
    pub fn with_client(client: reqwest::Client, auth_token: Option<String>) -> Self {
        Self { client, auth_token }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(AUTHORIZATION, format!("GoogleLogin auth={}", token)),
            None => request,
        }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get(&self, url: &str) -> Result<FeedResponse, CalendarError> {
        self.execute(self.client.get(url)).await
    }

    #[instrument(skip(self, body), level = "debug")]
    pub async fn post(&self, url: &str, body: String) -> Result<FeedResponse, CalendarError> {
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, ATOM_CONTENT_TYPE)
            .body(body);
        self.execute(request).await
    }

    #[instrument(skip(self, body), level = "debug")]
    pub async fn put(&self, url: &str, body: String) -> Result<FeedResponse, CalendarError> {
        let request = self
            .client
            .put(url)
            .header(CONTENT_TYPE, ATOM_CONTENT_TYPE)
            .header(CONTENT_LENGTH, body.len())
            .body(body);
        self.execute(request).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn delete(&self, url: &str) -> Result<FeedResponse, CalendarError> {
        self.execute(self.client.delete(url)).await
    }

    async fn execute(&self, request: RequestBuilder) -> Result<FeedResponse, CalendarError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        tracing::debug!(%status, bytes = body.len(), "feed response");

        Ok(FeedResponse {
            status,
            headers,
            body,
        })
    }
}

/// Status, headers and body text of one feed request.
#[derive(Debug, Clone)]
pub struct FeedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl FeedResponse {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// Turn a non-success status into a typed error.
    pub fn error_for_status(self) -> Result<Self, CalendarError> {
        let status = self.status;

        if status.is_success() {
            Ok(self)
        } else if status == StatusCode::UNAUTHORIZED {
            Err(CalendarError::TokenExpired)
        } else if status == StatusCode::FORBIDDEN {
            Err(CalendarError::AuthRequired)
        } else if status == StatusCode::NOT_FOUND {
            Err(CalendarError::NotFound(self.body))
        } else if status == StatusCode::CONFLICT {
            Err(CalendarError::Conflict)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = self
                .headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            Err(CalendarError::RateLimited(retry_after))
        } else {
            Err(CalendarError::ApiError(format!("{}: {}", status, self.body)))
        }
    }
}
