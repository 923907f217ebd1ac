//! In-process calendar store.
//!
//! Backs the engine's tests and `--dry-run` style tooling. It can be told to
//! fail listings or writes so that partial-failure paths are reachable.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::remote::{CalendarStore, RemoteEvent};
use crate::shift::{ShiftId, ShiftRecord};
use crate::window::SyncWindow;

#[derive(Debug, Default)]
struct State {
    events: BTreeMap<String, RemoteEvent>,
    foreign: Vec<String>,
    next_resource: u64,
    writes: usize,
    lists: usize,
    fail_lists_after: Option<usize>,
    failing_writes: HashSet<ShiftId>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    name: String,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryStore {
            name: name.into(),
            state: Mutex::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep going.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Put an event in place as-is, bypassing the engine. Returns its resource.
    pub fn insert_raw(&self, mut event: RemoteEvent) -> String {
        let mut state = self.state();
        if event.resource.is_empty() {
            event.resource = next_resource(&mut state);
        }
        let resource = event.resource.clone();
        state.events.insert(resource.clone(), event);
        resource
    }

    /// Add an unmanaged event the sync must never see or touch.
    pub fn insert_foreign(&self, title: impl Into<String>) {
        self.state().foreign.push(title.into());
    }

    /// Let `n` more listings succeed, then fail every one after that.
    pub fn fail_lists_after(&self, n: usize) {
        let mut state = self.state();
        state.fail_lists_after = Some(state.lists + n);
    }

    pub fn fail_writes_for(&self, identity: &ShiftId) {
        self.state().failing_writes.insert(identity.clone());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.fail_lists_after = None;
        state.failing_writes.clear();
    }

    /// Every managed event, ordered by resource.
    pub fn events(&self) -> Vec<RemoteEvent> {
        self.state().events.values().cloned().collect()
    }

    pub fn foreign(&self) -> Vec<String> {
        self.state().foreign.clone()
    }

    /// Number of successful creates, updates and deletes so far.
    pub fn write_count(&self) -> usize {
        self.state().writes
    }
}

fn next_resource(state: &mut State) -> String {
    state.next_resource += 1;
    format!("mem://{}", state.next_resource)
}

fn check_write(state: &State, identity: &ShiftId) -> StoreResult<()> {
    if state.failing_writes.contains(identity) {
        return Err(StoreError::Write(format!("injected failure for {identity}")));
    }
    Ok(())
}

#[async_trait]
impl CalendarStore for MemoryStore {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn list_managed(&self, window: &SyncWindow) -> StoreResult<Vec<RemoteEvent>> {
        let mut state = self.state();
        if state.fail_lists_after.is_some_and(|limit| state.lists >= limit) {
            return Err(StoreError::Unavailable(format!("{} is offline", self.name)));
        }
        state.lists += 1;

        Ok(state
            .events
            .values()
            .filter(|event| window.contains(event.start))
            .cloned()
            .collect())
    }

    async fn create(&self, shift: &ShiftRecord) -> StoreResult<()> {
        let mut state = self.state();
        check_write(&state, shift.identity())?;

        let resource = next_resource(&mut state);
        let event = RemoteEvent::from_shift(shift, resource.clone(), Some(Utc::now()));
        state.events.insert(resource, event);
        state.writes += 1;
        Ok(())
    }

    async fn update(&self, target: &RemoteEvent, shift: &ShiftRecord) -> StoreResult<()> {
        let mut state = self.state();
        check_write(&state, shift.identity())?;

        if !state.events.contains_key(&target.resource) {
            return Err(StoreError::Write(format!("no event at {}", target.resource)));
        }
        let event = RemoteEvent::from_shift(shift, target.resource.clone(), Some(Utc::now()));
        state.events.insert(target.resource.clone(), event);
        state.writes += 1;
        Ok(())
    }

    async fn delete(&self, target: &RemoteEvent) -> StoreResult<()> {
        let mut state = self.state();
        check_write(&state, &target.identity)?;

        if state.events.remove(&target.resource).is_some() {
            state.writes += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn shift(day: u32) -> ShiftRecord {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2025, 11, day, 9, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 11, day, 17, 0, 0).unwrap(),
            "Main Store",
            None,
        )
        .unwrap()
    }

    fn november() -> SyncWindow {
        SyncWindow::new(
            Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_assigns_fresh_resources() {
        let store = MemoryStore::new("test");
        store.create(&shift(3)).await.unwrap();
        store.create(&shift(3)).await.unwrap();

        let events = store.list_managed(&november()).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_ne!(events[0].resource, events[1].resource);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_window() {
        let store = MemoryStore::new("test");
        store.create(&shift(3)).await.unwrap();

        let december = SyncWindow::new(november().end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert!(store.list_managed(&december).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_event_succeeds() {
        let store = MemoryStore::new("test");
        let ghost = RemoteEvent::from_shift(&shift(3), "mem://404", None);

        assert!(store.delete(&ghost).await.is_ok());
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_event_fails() {
        let store = MemoryStore::new("test");
        let ghost = RemoteEvent::from_shift(&shift(3), "mem://404", None);

        assert!(matches!(store.update(&ghost, &shift(4)).await, Err(StoreError::Write(_))));
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = MemoryStore::new("test");
        store.fail_writes_for(shift(3).identity());
        assert!(store.create(&shift(3)).await.is_err());
        assert!(store.create(&shift(4)).await.is_ok());

        store.fail_lists_after(1);
        assert!(store.list_managed(&november()).await.is_ok());
        assert!(matches!(
            store.list_managed(&november()).await,
            Err(StoreError::Unavailable(_))
        ));

        store.clear_failures();
        assert!(store.list_managed(&november()).await.is_ok());
    }
}
