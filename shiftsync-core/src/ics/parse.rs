//! ICS parsing for events read back from a calendar store.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{read_calendar, unfold},
};

use crate::constants::SHIFT_ID_PROPERTY;
use crate::marker;
use crate::remote::RemoteEvent;

/// The fields of a VEVENT the sync cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub uid: String,
    pub summary: String,
    pub location: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub last_modified: Option<DateTime<Utc>>,
    pub shift_id: Option<String>,
}

impl ParsedEvent {
    /// Turn a parsed event into a managed [`RemoteEvent`] stored at `resource`.
    ///
    /// The identity comes from the UID, then the `X-SHIFTSYNC-ID` property,
    /// then the resource file name. `None` means the event is foreign.
    pub fn into_remote(self, resource: &str) -> Option<RemoteEvent> {
        let identity = marker::identity_from_uid(&self.uid)
            .or_else(|| self.shift_id.as_deref().and_then(marker::identity_from_uid))
            .or_else(|| marker::identity_from_href(resource))?;

        Some(RemoteEvent {
            identity,
            resource: resource.to_string(),
            title: self.summary,
            location: self.location,
            start: self.start,
            end: self.end,
            memo: self.description.as_deref().and_then(marker::strip_from_notes),
            last_modified: self.last_modified,
        })
    }
}

/// Parse the first VEVENT in `content`.
///
/// Floating times, and times whose TZID is not a known IANA zone, are read
/// in `default_tz`. An all-day event starts at local midnight.
pub fn parse_event(content: &str, default_tz: Tz) -> Option<ParsedEvent> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let uid = vevent.find_prop("UID")?.val.to_string();
    let start = to_utc(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?, default_tz)?;
    let end = match vevent.find_prop("DTEND") {
        Some(prop) => to_utc(DatePerhapsTime::try_from(prop).ok()?, default_tz)?,
        None => start,
    };

    let text = |name: &str| vevent.find_prop(name).map(|p| p.val.to_string());

    Some(ParsedEvent {
        uid,
        summary: text("SUMMARY").unwrap_or_default(),
        location: text("LOCATION").unwrap_or_default(),
        description: text("DESCRIPTION").filter(|d| !d.is_empty()),
        start,
        end,
        last_modified: text("LAST-MODIFIED").as_deref().and_then(parse_utc_stamp),
        shift_id: text(SHIFT_ID_PROPERTY),
    })
}

fn to_utc(dpt: DatePerhapsTime, default_tz: Tz) -> Option<DateTime<Utc>> {
    match dpt {
        DatePerhapsTime::Date(date) => local_to_utc(midnight(date), default_tz),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Some(dt),
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => local_to_utc(naive, default_tz),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            let tz = tzid.parse::<Tz>().unwrap_or(default_tz);
            local_to_utc(date_time, tz)
        }
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_utc_stamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), "%Y%m%dT%H%M%S")
        .ok()
        .map(|dt| dt.and_utc())
}
