use std::fmt;

use chrono::{DateTime, Utc};

use crate::remote::RemoteEvent;
use crate::shift::{ShiftId, ShiftRecord};
use crate::sync::DiffKind;

/// One planned change, as shown to the user.
#[derive(Debug, Clone)]
pub struct ShiftDiff {
    pub kind: DiffKind,
    pub old: Option<RemoteEvent>,
    pub new: Option<ShiftRecord>,
}

impl fmt::Display for ShiftDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.new, &self.old) {
            (Some(new), _) => write!(f, "{}: {}", self.kind, new),
            (None, Some(old)) => write!(f, "{}: {}", self.kind, old),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

impl ShiftDiff {
    /// The change needed to turn `old` into `new`, if any.
    pub fn get_diff(old: Option<RemoteEvent>, new: Option<ShiftRecord>) -> Option<ShiftDiff> {
        let kind = match (&old, &new) {
            (None, Some(_)) => DiffKind::Create,
            (Some(_), None) => DiffKind::Delete,
            (Some(old), Some(new)) if new.content_differs(old) => DiffKind::Update,
            _ => return None,
        };
        Some(ShiftDiff { kind, old, new })
    }

    pub fn identity(&self) -> Option<&ShiftId> {
        self.new
            .as_ref()
            .map(ShiftRecord::identity)
            .or(self.old.as_ref().map(|e| &e.identity))
    }

    /// Start of the shift this change is about (prefer new, fall back to old).
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.new
            .as_ref()
            .map(ShiftRecord::start_utc)
            .or(self.old.as_ref().map(|e| e.start))
    }
}
