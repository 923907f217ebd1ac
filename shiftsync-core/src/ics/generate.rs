//! ICS generation for shift events.

use chrono::{DateTime, Utc};
use icalendar::{Calendar, Component, EventLike};

use crate::constants::{ICS_PRODID, SHIFT_ID_PROPERTY};
use crate::shift::ShiftRecord;

const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// A single-event calendar object for `shift`, as uploaded to a CalDAV store.
///
/// Times are written in UTC so the object does not depend on VTIMEZONE data.
pub fn generate_ics(shift: &ShiftRecord, stamp: DateTime<Utc>) -> String {
    let mut cal = Calendar::new();
    cal.push(shift_event(shift, stamp));
    strip_ics_bloat(&cal.done().to_string())
}

/// One calendar holding every shift, for `shiftsync list --ics`.
pub fn generate_export(shifts: &[ShiftRecord], stamp: DateTime<Utc>) -> String {
    let mut cal = Calendar::new();
    cal.name("shiftsync");
    for shift in shifts {
        cal.push(shift_event(shift, stamp));
    }
    strip_ics_bloat(&cal.done().to_string())
}

fn shift_event(shift: &ShiftRecord, stamp: DateTime<Utc>) -> icalendar::Event {
    let stamp = stamp.format(UTC_FORMAT).to_string();

    let mut event = icalendar::Event::new();
    event.uid(shift.identity().as_str());
    event.summary(shift.title());
    event.add_property("DTSTAMP", &stamp);
    event.add_property("LAST-MODIFIED", &stamp);
    event.add_property("DTSTART", shift.start_utc().format(UTC_FORMAT).to_string());
    event.add_property("DTEND", shift.end_utc().format(UTC_FORMAT).to_string());

    if !shift.location().is_empty() {
        event.location(shift.location());
    }
    if let Some(memo) = shift.memo() {
        event.description(memo);
    }

    event.add_property(SHIFT_ID_PROPERTY, shift.identity().as_str());
    event.done()
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with ours
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(ICS_PRODID);
            result.push_str("\r\n");
            continue;
        }
        if line == "CALSCALE:GREGORIAN" {
            continue;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn shift(memo: Option<&str>) -> ShiftRecord {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2025, 11, 3, 10, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 11, 3, 18, 0, 0).unwrap(),
            "Store A",
            memo.map(str::to_string),
        )
        .unwrap()
    }

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 20, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_generate_ics_uses_identity_and_utc() {
        let shift = shift(None);
        let ics = generate_ics(&shift, stamp());

        assert!(ics.contains(&format!("UID:{}", shift.identity())), "ICS:\n{ics}");
        assert!(ics.contains("DTSTART:20251103T010000Z"), "ICS:\n{ics}");
        assert!(ics.contains("DTEND:20251103T090000Z"), "ICS:\n{ics}");
        assert!(ics.contains("LAST-MODIFIED:20251020T083000Z"), "ICS:\n{ics}");
        assert!(ics.contains(&format!("X-SHIFTSYNC-ID:{}", shift.identity())), "ICS:\n{ics}");
        assert!(ics.contains("PRODID:-//shiftsync//EN"), "ICS:\n{ics}");
        assert!(!ics.contains("DESCRIPTION"), "ICS:\n{ics}");
        assert!(!ics.contains("CALSCALE"), "ICS:\n{ics}");
    }

    #[test]
    fn test_generate_ics_writes_memo_as_description() {
        let ics = generate_ics(&shift(Some("bring keys")), stamp());
        assert!(ics.contains("DESCRIPTION:bring keys"), "ICS:\n{ics}");
    }

    #[test]
    fn test_generate_export_has_every_shift() {
        let tz = FixedOffset::east_opt(9 * 3600).unwrap();
        let other = ShiftRecord::new(
            "Shift",
            tz.with_ymd_and_hms(2025, 11, 4, 10, 0, 0).unwrap(),
            tz.with_ymd_and_hms(2025, 11, 4, 18, 0, 0).unwrap(),
            "Store B",
            None,
        )
        .unwrap();

        let ics = generate_export(&[shift(None), other], stamp());
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert_eq!(ics.matches("BEGIN:VCALENDAR").count(), 1);
    }
}
