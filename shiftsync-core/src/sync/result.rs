use serde::{Deserialize, Serialize};

use crate::remote::RemoteEvent;
use crate::shift::{ShiftId, ShiftRecord};
use crate::sync::{DiffKind, ShiftDiff};

/// A single create/update/delete the store rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedChange {
    pub kind: DiffKind,
    pub identity: ShiftId,
    pub shift: String,
    pub error: String,
}

/// What a reconciliation run actually did. Only successful writes are listed.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    pub created: Vec<ShiftRecord>,
    pub updated: Vec<(RemoteEvent, ShiftRecord)>,
    pub deleted: Vec<RemoteEvent>,
    pub failed: Vec<FailedChange>,
    pub duplicates_removed: usize,
    pub retained_past: usize,
}

impl SyncResult {
    pub fn added(&self) -> usize {
        self.created.len()
    }

    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    pub fn deleted_count(&self) -> usize {
        self.deleted.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Nothing was written and nothing failed.
    pub fn is_noop(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.deleted.is_empty()
            && self.failed.is_empty()
            && self.duplicates_removed == 0
    }

    /// Applied changes as diffs, ordered by shift start.
    pub fn diffs(&self) -> Vec<ShiftDiff> {
        let deletes = self.deleted.iter().map(|e| ShiftDiff::get_diff(Some(e.clone()), None));
        let creates = self.created.iter().map(|s| ShiftDiff::get_diff(None, Some(s.clone())));
        let updates = self
            .updated
            .iter()
            .map(|(e, s)| ShiftDiff::get_diff(Some(e.clone()), Some(s.clone())));

        let mut diffs: Vec<ShiftDiff> = deletes.chain(creates).chain(updates).flatten().collect();
        diffs.sort_by_key(ShiftDiff::start);
        diffs
    }

    /// Fold the result of another window of the same target into this one.
    pub fn merge(&mut self, other: SyncResult) {
        self.created.extend(other.created);
        self.updated.extend(other.updated);
        self.deleted.extend(other.deleted);
        self.failed.extend(other.failed);
        self.duplicates_removed += other.duplicates_removed;
        self.retained_past += other.retained_past;
    }
}

/// Results for several sync targets.
#[derive(Debug, Default)]
pub struct BatchResult(pub Vec<SyncResult>);

impl BatchResult {
    /// `(added, updated, deleted)` across all targets.
    pub fn counts(&self) -> (usize, usize, usize) {
        self.0.iter().fold((0, 0, 0), |(a, u, d), r| {
            (a + r.added(), u + r.updated_count(), d + r.deleted_count())
        })
    }

    pub fn failed_count(&self) -> usize {
        self.0.iter().map(SyncResult::failed_count).sum()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.0.iter().map(|r| r.duplicates_removed).sum()
    }

    pub fn is_noop(&self) -> bool {
        self.0.iter().all(SyncResult::is_noop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn shift() -> ShiftRecord {
        let tz = FixedOffset::east_opt(0).unwrap();
        ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2025, 11, 3, 10, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 11, 3, 18, 0, 0).unwrap(),
            "Store A",
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_counts_and_noop() {
        let mut result = SyncResult::default();
        assert!(result.is_noop());

        result.retained_past = 2;
        assert!(result.is_noop());

        result.created.push(shift());
        assert!(!result.is_noop());
        assert_eq!(result.added(), 1);
    }

    #[test]
    fn test_merge_and_batch_totals() {
        let mut first = SyncResult {
            created: vec![shift()],
            ..Default::default()
        };
        first.merge(SyncResult {
            deleted: vec![RemoteEvent::from_shift(&shift(), "mem://1", None)],
            duplicates_removed: 1,
            ..Default::default()
        });

        let second = SyncResult {
            failed: vec![FailedChange {
                kind: DiffKind::Update,
                identity: shift().identity().clone(),
                shift: shift().to_string(),
                error: "boom".into(),
            }],
            ..Default::default()
        };

        let batch = BatchResult(vec![first, second]);
        assert_eq!(batch.counts(), (1, 0, 1));
        assert_eq!(batch.failed_count(), 1);
        assert_eq!(batch.duplicates_removed(), 1);
        assert!(!batch.is_noop());
    }
}
