//! Shift records and their identities.

mod identity;
mod record;

use std::collections::HashSet;

pub use identity::ShiftId;
pub use record::ShiftRecord;

/// Collapse records sharing an identity, keeping the first one seen.
///
/// Records with the same identity have the same start, end and location, so
/// which copy survives only matters for title/memo. The result is sorted by
/// start time.
pub fn dedup_desired(records: impl IntoIterator<Item = ShiftRecord>) -> Vec<ShiftRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<ShiftRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.identity().clone()))
        .collect();

    unique.sort_by(|a, b| a.start().cmp(&b.start()).then_with(|| a.identity().cmp(b.identity())));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn shift(day: u32, h: u32, location: &str, memo: Option<&str>) -> ShiftRecord {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2025, 11, day, h, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 11, day, h + 8, 0, 0).unwrap(),
            location,
            memo.map(String::from),
        )
        .unwrap()
    }

    #[test]
    fn test_dedup_desired_first_seen_wins() {
        let first = shift(3, 10, "Store A", Some("first"));
        let second = shift(3, 10, "Store A", Some("second"));
        let other = shift(3, 10, "Store B", None);

        let unique = dedup_desired(vec![first.clone(), second, other.clone()]);

        assert_eq!(unique.len(), 2);
        assert!(unique.contains(&first));
        assert!(unique.contains(&other));
    }

    #[test]
    fn test_dedup_desired_sorts_by_start() {
        let late = shift(5, 9, "Store A", None);
        let early = shift(2, 9, "Store A", None);

        let unique = dedup_desired(vec![late.clone(), early.clone()]);

        assert_eq!(unique, vec![early, late]);
    }
}
