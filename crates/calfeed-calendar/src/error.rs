//! Calendar-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Token expired")]
    TokenExpired,

    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: resource was modified")]
    Conflict,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Malformed XML: {0}")]
    Xml(#[from] xmltree::ParseError),

    #[error("Failed to write XML: {0}")]
    XmlWrite(#[from] xmltree::Error),

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// The service accepted a create but its response could not be loaded.
    #[error("Calendar save failed: {0}")]
    SaveFailed(String),

    #[error("Calendar ID is required")]
    MissingId,

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl CalendarError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthRequired => "Please sign in to your Google account".to_string(),
            Self::TokenExpired => "Your session has expired. Please sign in again.".to_string(),
            Self::RateLimited(secs) => format!("Too many requests. Please wait {} seconds.", secs),
            Self::NotFound(_) => "Calendar not found".to_string(),
            Self::Conflict => "The calendar was modified elsewhere. Please refresh.".to_string(),
            Self::ApiError(msg) => format!("Calendar error: {}", msg),
            Self::Xml(_) | Self::XmlWrite(_) | Self::InvalidEntry(_) => {
                "Received calendar data that could not be read".to_string()
            }
            Self::SaveFailed(_) => "The calendar could not be created. Please try again.".to_string(),
            Self::MissingId => "The calendar must be saved first".to_string(),
            Self::NetworkError(_) => "Network error. Check your connection.".to_string(),
        }
    }

    /// Whether this error should trigger a token refresh.
    pub fn should_refresh_token(&self) -> bool {
        matches!(self, Self::TokenExpired | Self::AuthRequired)
    }

    /// Whether the caller may sensibly repeat the request.
    ///
    /// The library itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited(_) | Self::NetworkError(_))
    }
}
