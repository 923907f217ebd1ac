use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::write_atomic;
use crate::error::{CoreError, CoreResult};
use crate::shift::{ShiftRecord, dedup_desired};
use crate::window::YearMonth;

const SNAPSHOT_FILE: &str = "snapshot.json";

/// The desired shift set as of the last successful sync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub saved_at: Option<DateTime<Utc>>,
    pub shifts: Vec<ShiftRecord>,
}

fn starts_in(shift: &ShiftRecord, months: &[YearMonth]) -> bool {
    months.contains(&YearMonth::of(shift.start().date_naive()))
}

/// The unique shifts of `shifts` that start in one of `months`.
///
/// A month page can list days of the following month; those belong to that
/// month's snapshot, not to this one.
pub fn in_months(months: &[YearMonth], shifts: impl IntoIterator<Item = ShiftRecord>) -> Vec<ShiftRecord> {
    dedup_desired(shifts.into_iter().filter(|s| starts_in(s, months)))
}

impl Snapshot {
    /// Shifts starting in one of `months`.
    pub fn for_months(&self, months: &[YearMonth]) -> Vec<ShiftRecord> {
        self.shifts.iter().filter(|s| starts_in(s, months)).cloned().collect()
    }

    /// Replace everything known about `months` with `current`, keeping other
    /// months. Shifts of `current` outside `months` are ignored.
    pub fn replace_months(&mut self, months: &[YearMonth], current: Vec<ShiftRecord>, now: DateTime<Utc>) {
        self.shifts.retain(|s| !starts_in(s, months));
        self.shifts.extend(in_months(months, current));
        self.shifts.sort_by_key(ShiftRecord::start_utc);
        self.saved_at = Some(now);
    }
}

pub struct SnapshotCache {
    path: PathBuf,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SnapshotCache { path: path.into() }
    }

    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SNAPSHOT_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored snapshot. Missing or unreadable files yield an empty one.
    pub fn load(&self) -> Snapshot {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Snapshot::default();
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring corrupt snapshot: {e}");
                Snapshot::default()
            }
        }
    }

    pub fn save(&self, snapshot: &Snapshot) -> CoreResult<()> {
        let content =
            serde_json::to_string_pretty(snapshot).map_err(|e| CoreError::Serialization(e.to_string()))?;
        write_atomic(&self.path, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn shift(month: u32, day: u32) -> ShiftRecord {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2025, month, day, 9, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, month, day, 17, 0, 0).unwrap(),
            "Store A",
            None,
        )
        .unwrap()
    }

    fn ym(month: u32) -> YearMonth {
        YearMonth::new(2025, month).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = SnapshotCache::in_dir(dir.path()).load();
        assert!(snapshot.shifts.is_empty());
        assert!(snapshot.saved_at.is_none());
    }

    #[test]
    fn test_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::in_dir(dir.path());
        std::fs::write(cache.path(), "{ not json").unwrap();

        assert!(cache.load().shifts.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SnapshotCache::in_dir(&dir.path().join("nested"));

        let mut snapshot = Snapshot::default();
        snapshot.replace_months(&[ym(11)], vec![shift(11, 3)], Utc::now());
        cache.save(&snapshot).unwrap();

        let loaded = cache.load();
        assert_eq!(loaded.shifts, vec![shift(11, 3)]);
        assert!(!dir.path().join("nested").join("snapshot.json.tmp").exists());
    }

    #[test]
    fn test_replace_months_keeps_other_months() {
        let mut snapshot = Snapshot {
            saved_at: None,
            shifts: vec![shift(10, 20), shift(11, 3)],
        };

        snapshot.replace_months(&[ym(11)], vec![shift(11, 4)], Utc::now());

        assert_eq!(snapshot.shifts, vec![shift(10, 20), shift(11, 4)]);
        assert_eq!(snapshot.for_months(&[ym(11)]), vec![shift(11, 4)]);
    }

    #[test]
    fn test_next_month_rows_do_not_pile_up() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let new_year = ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2026, 1, 1, 15, 0, 0).unwrap(),
            "Store A",
            None,
        )
        .unwrap();
        let months = [ym(11), ym(12)];
        let scraped = vec![shift(11, 3), shift(12, 31), new_year];
        let notify_from = ym(11).first_day();

        let mut snapshot = Snapshot::default();
        for run in 0..3 {
            let current = in_months(&months, scraped.clone());
            let changes = crate::changes::detect(&snapshot.for_months(&months), &current, notify_from);
            if run > 0 {
                assert!(changes.is_empty(), "run {run}: {:?}", changes.lines());
            }
            snapshot.replace_months(&months, scraped.clone(), Utc::now());
            assert_eq!(snapshot.shifts, vec![shift(11, 3), shift(12, 31)]);
        }
    }
}
