//! How a shift identity is embedded into, and recovered from, a calendar event.
//!
//! Stores with structured event ids use the identity as the UID and as the
//! resource file name. Stores that only carry free text get a tag line in
//! the notes. Anything that does not yield a valid [`ShiftId`] is foreign.

use crate::shift::ShiftId;

const NOTES_TAG_OPEN: &str = "[shiftsync:";
const NOTES_TAG_CLOSE: char = ']';

/// The identity carried by an event UID, if it is one of ours.
pub fn identity_from_uid(uid: &str) -> Option<ShiftId> {
    ShiftId::parse(uid.trim())
}

/// The identity encoded in a resource path such as
/// `/calendars/abc/shift-20251103-0900-1700-1a2b3c4d.ics`.
pub fn identity_from_href(href: &str) -> Option<ShiftId> {
    let name = href.trim_end_matches('/').rsplit('/').next()?;
    ShiftId::parse(name.strip_suffix(".ics")?)
}

/// Resource file name for a managed event.
pub fn resource_name(id: &ShiftId) -> String {
    format!("{id}.ics")
}

/// Append the identity tag to `memo` on its own line.
pub fn embed_in_notes(memo: Option<&str>, id: &ShiftId) -> String {
    let tag = format!("{NOTES_TAG_OPEN}{id}{NOTES_TAG_CLOSE}");
    match memo.map(str::trim_end).filter(|m| !m.is_empty()) {
        Some(memo) => format!("{memo}\n{tag}"),
        None => tag,
    }
}

/// The first valid identity tag in `notes`.
pub fn extract_from_notes(notes: &str) -> Option<ShiftId> {
    notes.lines().find_map(parse_tag_line)
}

/// `notes` without identity tag lines, or `None` if nothing else remains.
pub fn strip_from_notes(notes: &str) -> Option<String> {
    let memo = notes
        .lines()
        .filter(|line| parse_tag_line(line).is_none())
        .collect::<Vec<_>>()
        .join("\n");
    let memo = memo.trim();
    (!memo.is_empty()).then(|| memo.to_string())
}

fn parse_tag_line(line: &str) -> Option<ShiftId> {
    let inner = line
        .trim()
        .strip_prefix(NOTES_TAG_OPEN)?
        .strip_suffix(NOTES_TAG_CLOSE)?;
    ShiftId::parse(inner)
}
