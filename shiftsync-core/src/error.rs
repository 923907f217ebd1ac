//! Error types for the shiftsync ecosystem.
//!
//! Only [`SyncError`] and [`SourceError`] abort work early. Write failures are
//! recovered inside the reconciler and surface as counts in a
//! [`SyncResult`](crate::sync::SyncResult).

use thiserror::Error;

/// Errors from configuration, local files and ICS handling.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid month '{0}'. Expected YYYY-MM")]
    InvalidMonth(String),

    #[error("Invalid month range: {0}")]
    InvalidRange(String),
}

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// A scraped row that could not become a [`ShiftRecord`](crate::shift::ShiftRecord).
///
/// Rows like this are dropped by the source adapter; they never abort a run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedRecord {
    #[error("shift ends before it starts ({start} >= {end})")]
    EndNotAfterStart { start: String, end: String },

    #[error("unparseable row: {0}")]
    Unparseable(String),
}

/// Failures talking to the shift-management site.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Login to shift site failed: {0}")]
    Login(String),

    #[error("Request to shift site failed: {0}")]
    Http(String),

    #[error("Shift page layout not recognized: {0}")]
    Layout(String),
}

/// Failures reported by a [`CalendarStore`](crate::remote::CalendarStore).
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Existing state could not be read (transport, auth, timeout).
    #[error("Calendar store unavailable: {0}")]
    Unavailable(String),

    /// A single create/update/delete failed.
    #[error("Calendar write failed: {0}")]
    Write(String),

    /// The addressed event does not exist. Deletes fold this into success.
    #[error("Event not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that abort reconciliation of one store target.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Cannot read existing events from '{store}': {source}")]
    StoreUnavailable {
        store: String,
        #[source]
        source: StoreError,
    },
}
