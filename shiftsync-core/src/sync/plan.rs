//! Pure computation of the edit script between desired and existing shifts.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::remote::RemoteEvent;
use crate::shift::{ShiftId, ShiftRecord, dedup_desired};
use crate::sync::ShiftDiff;

/// What a run intends to write. The three change sets are disjoint by identity.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub to_create: Vec<ShiftRecord>,
    pub to_update: Vec<(RemoteEvent, ShiftRecord)>,
    pub to_delete: Vec<RemoteEvent>,
    /// Existing events nobody wants any more that are kept because they are over.
    pub retained_past: Vec<RemoteEvent>,
    /// Extra copies the dedup pass would remove before applying this plan.
    pub duplicates: Vec<RemoteEvent>,
}

impl SyncPlan {
    /// Diff `desired` against `existing` (already deduplicated).
    ///
    /// Existing events whose identity is not desired are deleted, unless they
    /// ended before `now`.
    pub fn compute(desired: &[ShiftRecord], existing: &[RemoteEvent], now: DateTime<Utc>) -> Self {
        let desired = dedup_desired(desired.iter().cloned());
        let desired_ids: HashSet<&ShiftId> = desired.iter().map(ShiftRecord::identity).collect();

        let mut existing_by_id: HashMap<&ShiftId, &RemoteEvent> = HashMap::new();
        for event in existing {
            existing_by_id.entry(&event.identity).or_insert(event);
        }

        let mut plan = SyncPlan::default();

        for shift in &desired {
            match existing_by_id.get(shift.identity()) {
                None => plan.to_create.push(shift.clone()),
                Some(current) if shift.content_differs(current) => {
                    plan.to_update.push(((*current).clone(), shift.clone()));
                }
                Some(_) => {}
            }
        }

        for event in existing.iter().filter(|e| !desired_ids.contains(&e.identity)) {
            if event.is_past(now) {
                plan.retained_past.push(event.clone());
            } else {
                plan.to_delete.push(event.clone());
            }
        }

        plan.to_delete.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.resource.cmp(&b.resource)));
        plan.to_update.sort_by_key(|(_, shift)| shift.start_utc());

        plan
    }

    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }

    /// All changes as diffs, ordered by shift start.
    pub fn diffs(&self) -> Vec<ShiftDiff> {
        let mut diffs: Vec<ShiftDiff> = self
            .to_delete
            .iter()
            .filter_map(|event| ShiftDiff::get_diff(Some(event.clone()), None))
            .chain(
                self.to_create
                    .iter()
                    .filter_map(|shift| ShiftDiff::get_diff(None, Some(shift.clone()))),
            )
            .chain(
                self.to_update
                    .iter()
                    .filter_map(|(event, shift)| ShiftDiff::get_diff(Some(event.clone()), Some(shift.clone()))),
            )
            .collect();

        diffs.sort_by_key(ShiftDiff::start);
        diffs
    }
}
