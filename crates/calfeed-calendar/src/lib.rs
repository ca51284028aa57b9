//! Google Calendar data feed client.
//!
//! Lists, finds, creates, updates and deletes calendars over the Atom
//! feeds, toggles public access through the ACL feed, reads events and
//! renders embeddable iframes.

pub mod acl;
pub mod calendar;
pub mod client;
mod codec;
pub mod embed;
pub mod error;
pub mod event;
mod finder;
pub mod service;
pub mod types;

pub use calendar::Calendar;
pub use calfeed_core::ServiceConfig;
pub use client::{FeedClient, FeedResponse};
pub use embed::{to_iframe, EmbedOptions, OptionValue};
pub use error::CalendarError;
pub use event::Event;
pub use service::Service;
pub use types::{CalendarAttributes, EventFeed, EventStatus, EventTime, Scope, SkippedEntry};
