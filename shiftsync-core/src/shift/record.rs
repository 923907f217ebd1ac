//! The canonical shift representation.

use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MalformedRecord;
use crate::remote::RemoteEvent;
use crate::shift::ShiftId;

/// One scheduled work shift.
///
/// Constructed fresh on every run and never mutated afterwards: the identity
/// is computed once from start, end and location in [`ShiftRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredShift", into = "StoredShift")]
pub struct ShiftRecord {
    identity: ShiftId,
    title: String,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    location: String,
    memo: Option<String>,
}

impl ShiftRecord {
    pub fn new(
        title: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        location: impl Into<String>,
        memo: Option<String>,
    ) -> Result<Self, MalformedRecord> {
        if start >= end {
            return Err(MalformedRecord::EndNotAfterStart {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        let location = location.into();
        let identity = ShiftId::derive(&start, &end, &location);

        Ok(ShiftRecord {
            identity,
            title: title.into(),
            start,
            end,
            location,
            memo: memo.filter(|m| !m.is_empty()),
        })
    }

    pub fn identity(&self) -> &ShiftId {
        &self.identity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn memo(&self) -> Option<&str> {
        self.memo.as_deref()
    }

    /// Whether writing this record over `remote` would change what the
    /// calendar shows. Memo and identity are deliberately not compared.
    pub fn content_differs(&self, remote: &RemoteEvent) -> bool {
        self.start_utc() != remote.start
            || self.end_utc() != remote.end
            || self.title != remote.title
            || self.location != remote.location
    }
}

impl fmt::Display for ShiftRecord {
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

/// On-disk form of a shift. The identity is recomputed on load instead of
/// being trusted from the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredShift {
    title: String,
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
    location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    memo: Option<String>,
}

impl TryFrom<StoredShift> for ShiftRecord {
    type Error = MalformedRecord;

    fn try_from(stored: StoredShift) -> Result<Self, Self::Error> {
        ShiftRecord::new(stored.title, stored.start, stored.end, stored.location, stored.memo)
    }
}

impl From<ShiftRecord> for StoredShift {
    fn from(shift: ShiftRecord) -> Self {
        StoredShift {
            title: shift.title,
            start: shift.start,
            end: shift.end,
            location: shift.location,
            memo: shift.memo,
        }
    }
}
