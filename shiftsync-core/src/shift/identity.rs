//! Content-derived shift identity.
//!
//! A shift's identity is a pure function of its start, end and location. The
//! same shift scraped on two different runs (or on two different machines)
//! always maps to the same identity, which is what lets a run find the events
//! a previous run created.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

const ID_PREFIX: &str = "shift-";
const DIGEST_LEN: usize = 8;

/// Stable identifier of a shift: `shift-YYYYMMDD-HHMM-HHMM-<8 hex>`.
///
/// The readable part is the start date, start time and end time in the
/// shift's local wall clock. The hex suffix is a truncated SHA-1 over the
/// full start/end timestamps and the location, so two shifts at the same
/// time at different sites get different identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShiftId(String);

impl ShiftId {
    pub fn derive(start: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>, location: &str) -> Self {
        let key = format!(
            "{}-{}-{}",
            start.format("%Y%m%dT%H%M"),
            end.format("%Y%m%dT%H%M"),
            location
        );
        let digest = hex::encode(Sha1::digest(key.as_bytes()));

        ShiftId(format!(
            "{ID_PREFIX}{}-{}-{}-{}",
            start.format("%Y%m%d"),
            start.format("%H%M"),
            end.format("%H%M"),
            &digest[..DIGEST_LEN]
        ))
    }

    /// Parse an identity read back from a remote event.
    ///
    /// Returns `None` for anything that is not exactly in the identity format,
    /// so events created by other tools are never mistaken for ours.
    pub fn parse(s: &str) -> Option<Self> {
        let rest = s.strip_prefix(ID_PREFIX)?;
        let mut parts = rest.split('-');
        let (date, start, end, hash) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let digits = |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());
        let lower_hex = hash.len() == DIGEST_LEN
            && hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));

        (digits(date, 8) && digits(start, 4) && digits(end, 4) && lower_hex)
            .then(|| ShiftId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShiftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShiftId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ShiftId::parse(&value).ok_or_else(|| format!("not a shift identity: {value}"))
    }
}

impl From<ShiftId> for String {
    fn from(id: ShiftId) -> Self {
        id.0
    }
}
