//! Restores "at most one event per identity" in a store.
//!
//! Stores have no uniqueness constraint on our marker, so two runs racing (or
//! a run interrupted between a create and its bookkeeping) can leave several
//! copies of one shift behind. One copy survives, the rest are deleted.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::remote::{CalendarStore, RemoteEvent};
use crate::shift::ShiftId;
use crate::sync::{DiffKind, FailedChange};

/// Partition of a listing into one survivor per identity and the extra copies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub survivors: Vec<RemoteEvent>,
    pub losers: Vec<RemoteEvent>,
}

/// Pick one survivor per identity. Pure; deletes nothing.
///
/// Preference order: most recently modified (unknown counts as oldest), then
/// the most complete copy, then the earliest start, then the resource path so
/// that every run picks the same winner.
pub fn resolve(events: Vec<RemoteEvent>) -> Resolution {
    let mut groups: BTreeMap<ShiftId, Vec<RemoteEvent>> = BTreeMap::new();
    for event in events {
        groups.entry(event.identity.clone()).or_default().push(event);
    }

    let mut resolution = Resolution::default();
    for (_, mut copies) in groups {
        copies.sort_by(preference);
        let mut copies = copies.into_iter();
        if let Some(survivor) = copies.next() {
            resolution.survivors.push(survivor);
        }
        resolution.losers.extend(copies);
    }

    resolution.survivors.sort_by_key(|e| e.start);
    resolution
}

fn quality(event: &RemoteEvent) -> u8 {
    u8::from(!event.title.trim().is_empty())
        + u8::from(!event.location.trim().is_empty())
        + u8::from(event.start < event.end)
}

/// `Less` means `a` is the better copy.
fn preference(a: &RemoteEvent, b: &RemoteEvent) -> Ordering {
    b.last_modified
        .cmp(&a.last_modified)
        .then_with(|| quality(b).cmp(&quality(a)))
        .then_with(|| a.start.cmp(&b.start))
        .then_with(|| a.resource.cmp(&b.resource))
}

#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub survivors: Vec<RemoteEvent>,
    pub removed: usize,
    pub failed: Vec<FailedChange>,
}

/// Resolve duplicates in `events` and delete the losers from `store`.
///
/// A loser that cannot be deleted is logged and reported; the survivors are
/// returned either way.
pub async fn dedupe(store: &dyn CalendarStore, events: Vec<RemoteEvent>) -> DedupOutcome {
    let Resolution { survivors, losers } = resolve(events);
    let mut outcome = DedupOutcome {
        survivors,
        ..Default::default()
    };

    for loser in losers {
        match store.delete(&loser).await {
            Ok(()) => {
                info!(store = %store.name(), resource = %loser.resource, "removed duplicate of {}", loser.identity);
                outcome.removed += 1;
            }
            Err(e) => {
                warn!(store = %store.name(), resource = %loser.resource, "failed to remove duplicate: {e}");
                outcome.failed.push(FailedChange {
                    kind: DiffKind::Delete,
                    identity: loser.identity.clone(),
                    shift: loser.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryStore;
    use crate::shift::ShiftRecord;
    use crate::window::SyncWindow;
    use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

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

    fn copy(resource: &str, modified: Option<DateTime<Utc>>) -> RemoteEvent {
        RemoteEvent::from_shift(&shift(), resource, modified)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_most_recent_copy_wins() {
        let hour_ago = copy("a", Some(now() - Duration::hours(1)));
        let day_ago = copy("b", Some(now() - Duration::days(1)));

        let resolution = resolve(vec![day_ago.clone(), hour_ago.clone()]);

        assert_eq!(resolution.survivors, vec![hour_ago]);
        assert_eq!(resolution.losers, vec![day_ago]);
    }

    #[test]
    fn test_unknown_modification_time_is_oldest() {
        let known = copy("b", Some(now() - Duration::days(30)));
        let unknown = copy("a", None);

        let resolution = resolve(vec![unknown, known.clone()]);
        assert_eq!(resolution.survivors, vec![known]);
    }

    #[test]
    fn test_more_complete_copy_wins_tie() {
        let mut bare = copy("a", None);
        bare.title.clear();
        let full = copy("b", None);

        let resolution = resolve(vec![bare, full.clone()]);
        assert_eq!(resolution.survivors, vec![full]);
    }

    #[test]
    fn test_identical_copies_resolve_deterministically() {
        let forward = resolve(vec![copy("b", None), copy("a", None), copy("c", None)]);
        let reverse = resolve(vec![copy("c", None), copy("a", None), copy("b", None)]);

        assert_eq!(forward, reverse);
        assert_eq!(forward.survivors[0].resource, "a");
        assert_eq!(forward.losers.len(), 2);
    }

    #[test]
    fn test_earlier_start_wins_when_modified_and_quality_tie() {
        let stamp = Some(now() - Duration::hours(2));
        let original = copy("z", stamp);
        let mut moved = copy("a", stamp);
        moved.start += Duration::hours(1);
        moved.end += Duration::hours(1);

        let resolution = resolve(vec![moved.clone(), original.clone()]);

        assert_eq!(resolution.survivors, vec![original]);
        assert_eq!(resolution.losers, vec![moved]);
    }

    #[test]
    fn test_distinct_identities_untouched() {
        let tz = FixedOffset::east_opt(0).unwrap();
        let other = ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2025, 11, 4, 10, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 11, 4, 18, 0, 0).unwrap(),
            "Store A",
            None,
        )
        .unwrap();

        let resolution = resolve(vec![copy("a", None), RemoteEvent::from_shift(&other, "b", None)]);
        assert_eq!(resolution.survivors.len(), 2);
        assert!(resolution.losers.is_empty());
    }

    #[tokio::test]
    async fn test_dedupe_converges() {
        let store = MemoryStore::new("test");
        for _ in 0..3 {
            store.create(&shift()).await.unwrap();
        }
        let window = SyncWindow::new(now(), now() + Duration::days(30));

        let listed = store.list_managed(&window).await.unwrap();
        let outcome = dedupe(&store, listed).await;
        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.survivors.len(), 1);

        let listed = store.list_managed(&window).await.unwrap();
        let again = dedupe(&store, listed).await;
        assert_eq!(again.removed, 0);
        assert_eq!(store.events().len(), 1);
    }
}
