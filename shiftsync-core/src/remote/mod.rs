//! Calendar stores: the write side of a sync.

pub mod memory;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreResult;
use crate::shift::{ShiftId, ShiftRecord};
use crate::window::SyncWindow;

pub use memory::MemoryStore;

/// A managed event as it currently exists in a calendar store.
///
/// `resource` locates this particular copy (a CalDAV href, an in-memory key),
/// so that duplicates sharing one identity can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEvent {
    pub identity: ShiftId,
    pub resource: String,
    pub title: String,
    pub location: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub memo: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl RemoteEvent {
    /// Build the event a store would hold after writing `shift` at `resource`.
    pub fn from_shift(shift: &ShiftRecord, resource: impl Into<String>, last_modified: Option<DateTime<Utc>>) -> Self {
        RemoteEvent {
            identity: shift.identity().clone(),
            resource: resource.into(),
            title: shift.title().to_string(),
            location: shift.location().to_string(),
            start: shift.start_utc(),
            end: shift.end_utc(),
            memo: shift.memo().map(str::to_string),
            last_modified,
        }
    }

    /// Finished before `now`. Past events are never deleted by a sync.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end < now
    }
}

impl fmt::Display for RemoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}-{}  {}",
            self.start.format("%Y-%m-%d"),
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.location
        )
    }
}

/// A calendar that holds managed shift events.
///
/// Implementations only ever return and touch events carrying a shift marker;
/// anything else in the calendar is invisible to the sync.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// Human-readable name used in logs and errors.
    fn name(&self) -> String;

    /// All managed events whose start lies in `window`.
    async fn list_managed(&self, window: &SyncWindow) -> StoreResult<Vec<RemoteEvent>>;

    async fn create(&self, shift: &ShiftRecord) -> StoreResult<()>;

    /// Overwrite the copy at `target` with the content of `shift`.
    async fn update(&self, target: &RemoteEvent, shift: &ShiftRecord) -> StoreResult<()>;

    /// Remove the copy at `target`. Deleting something already gone succeeds.
    async fn delete(&self, target: &RemoteEvent) -> StoreResult<()>;
}
