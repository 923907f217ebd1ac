//! Announcing what changed in the schedule since the last successful sync.
//!
//! This works on shifts, not on calendar state: the previous snapshot is
//! passed in by the caller and nothing here touches a store.

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::shift::{ShiftId, ShiftRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<ShiftRecord>,
    pub removed: Vec<ShiftRecord>,
    /// `(before, after)` pairs for shifts that moved within the same day and site.
    pub modified: Vec<(ShiftRecord, ShiftRecord)>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// One human-readable line per change, oldest shift first.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<(NaiveDate, String)> = Vec::with_capacity(self.len());
        lines.extend(self.added.iter().map(|s| (local_day(s), format!("New shift: {s}"))));
        lines.extend(self.removed.iter().map(|s| (local_day(s), format!("Cancelled: {s}"))));
        lines.extend(self.modified.iter().map(|(before, after)| {
            (
                local_day(after),
                format!(
                    "Changed: {} {}-{} -> {}-{}",
                    before.start().format("%Y-%m-%d"),
                    before.start().format("%H:%M"),
                    before.end().format("%H:%M"),
                    after.start().format("%H:%M"),
                    after.end().format("%H:%M"),
                ),
            )
        }));
        lines.sort_by_key(|(day, _)| *day);
        lines.into_iter().map(|(_, line)| line).collect()
    }
}

/// Compare two shift sets by identity.
///
/// A shift that disappeared and one that appeared on the same local day at
/// the same location are reported as a single modification. Shifts starting
/// before `notify_from` are ignored entirely.
pub fn detect(previous: &[ShiftRecord], current: &[ShiftRecord], notify_from: NaiveDate) -> ChangeSet {
    let relevant = |s: &&ShiftRecord| local_day(s) >= notify_from;

    let previous_ids: HashSet<&ShiftId> = previous.iter().map(ShiftRecord::identity).collect();
    let current_ids: HashSet<&ShiftId> = current.iter().map(ShiftRecord::identity).collect();

    let mut added: Vec<ShiftRecord> = current
        .iter()
        .filter(relevant)
        .filter(|s| !previous_ids.contains(s.identity()))
        .cloned()
        .collect();
    let removed: Vec<ShiftRecord> = previous
        .iter()
        .filter(relevant)
        .filter(|s| !current_ids.contains(s.identity()))
        .cloned()
        .collect();

    let mut changes = ChangeSet::default();
    for before in removed {
        let same_slot = added
            .iter()
            .position(|after| local_day(after) == local_day(&before) && after.location() == before.location());
        match same_slot {
            Some(index) => changes.modified.push((before, added.remove(index))),
            None => changes.removed.push(before),
        }
    }
    changes.added = added;

    changes.added.sort_by_key(ShiftRecord::start_utc);
    changes.removed.sort_by_key(ShiftRecord::start_utc);
    changes.modified.sort_by_key(|(_, after)| after.start_utc());
    changes
}

fn local_day(shift: &ShiftRecord) -> NaiveDate {
    shift.start().date_naive()
}
