//! CalDAV calendar store for shiftsync.
//!
//! Works against iCloud (which redirects every user to a per-account host)
//! and any other CalDAV server that supports `calendar-query` REPORTs.

mod client;
mod discovery;
mod store;
mod xml;

pub use client::CalDavClient;
pub use discovery::{CalendarHome, CalendarInfo, create_calendar, discover, list_calendars};
pub use store::CalDavStore;
