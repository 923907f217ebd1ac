//! Drives one store from its current state to the desired shifts.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{StoreError, SyncError};
use crate::remote::{CalendarStore, RemoteEvent};
use crate::shift::ShiftRecord;
use crate::sync::dedup::{self, DedupOutcome};
use crate::sync::{DiffKind, FailedChange, SyncPlan, SyncResult};
use crate::window::SyncWindow;

pub struct Reconciler<'a> {
    store: &'a dyn CalendarStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn CalendarStore) -> Self {
        Reconciler { store }
    }

    /// Compute what [`run`](Self::run) would do without writing anything.
    pub async fn plan(
        &self,
        desired: &[ShiftRecord],
        window: &SyncWindow,
        now: DateTime<Utc>,
    ) -> Result<SyncPlan, SyncError> {
        let desired = self.scope(desired, window);
        let existing = self.list(window).await?;

        let resolution = dedup::resolve(existing);
        let mut plan = SyncPlan::compute(&desired, &resolution.survivors, now);
        plan.duplicates = resolution.losers;
        Ok(plan)
    }

    /// List, dedup, plan, apply, then dedup again.
    ///
    /// Only a failed initial listing is an error. Individual write failures
    /// are logged and reported in [`SyncResult::failed`].
    pub async fn run(
        &self,
        desired: &[ShiftRecord],
        window: &SyncWindow,
        now: DateTime<Utc>,
    ) -> Result<SyncResult, SyncError> {
        let desired = self.scope(desired, window);
        let existing = self.list(window).await?;

        let DedupOutcome {
            survivors,
            removed,
            failed,
        } = dedup::dedupe(self.store, existing).await;
        let plan = SyncPlan::compute(&desired, &survivors, now);
        debug!(
            store = %self.store.name(),
            create = plan.to_create.len(),
            update = plan.to_update.len(),
            delete = plan.to_delete.len(),
            retained = plan.retained_past.len(),
            "planned sync for {window}"
        );

        let mut result = SyncResult {
            duplicates_removed: removed,
            retained_past: plan.retained_past.len(),
            failed,
            ..Default::default()
        };

        for event in plan.to_delete {
            match self.store.delete(&event).await {
                Ok(()) => {
                    info!(store = %self.store.name(), "deleted {event}");
                    result.deleted.push(event);
                }
                Err(e) => result.failed.push(self.failure(DiffKind::Delete, &event, e)),
            }
        }

        for shift in plan.to_create {
            match self.store.create(&shift).await {
                Ok(()) => {
                    info!(store = %self.store.name(), "created {shift}");
                    result.created.push(shift);
                }
                Err(e) => {
                    let target = RemoteEvent::from_shift(&shift, "", None);
                    result.failed.push(self.failure(DiffKind::Create, &target, e));
                }
            }
        }

        for (event, shift) in plan.to_update {
            match self.store.update(&event, &shift).await {
                Ok(()) => {
                    info!(store = %self.store.name(), "updated {shift}");
                    result.updated.push((event, shift));
                }
                Err(e) => result.failed.push(self.failure(DiffKind::Update, &event, e)),
            }
        }

        // A concurrent run may have created the same shifts meanwhile.
        match self.store.list_managed(window).await {
            Ok(events) => {
                let healed = dedup::dedupe(self.store, events).await;
                result.duplicates_removed += healed.removed;
                result.failed.extend(healed.failed);
            }
            Err(e) => warn!(store = %self.store.name(), "skipping post-sync duplicate check: {e}"),
        }

        Ok(result)
    }

    async fn list(&self, window: &SyncWindow) -> Result<Vec<RemoteEvent>, SyncError> {
        self.store
            .list_managed(window)
            .await
            .map_err(|source| SyncError::StoreUnavailable {
                store: self.store.name(),
                source,
            })
    }

    fn scope(&self, desired: &[ShiftRecord], window: &SyncWindow) -> Vec<ShiftRecord> {
        desired
            .iter()
            .filter(|shift| {
                let inside = window.contains(shift.start_utc());
                if !inside {
                    debug!("ignoring {shift}: starts outside {window}");
                }
                inside
            })
            .cloned()
            .collect()
    }

    fn failure(&self, kind: DiffKind, event: &RemoteEvent, error: StoreError) -> FailedChange {
        warn!(store = %self.store.name(), "failed to {} {event}: {error}", kind.verb());
        FailedChange {
            kind,
            identity: event.identity.clone(),
            shift: event.to_string(),
            error: error.to_string(),
        }
    }
}
