pub mod calendar;
pub mod config;
pub mod history;
pub mod list;
pub mod setup;
pub mod status;
pub mod sync;

use anyhow::{Result, bail};
use shiftsync_core::YearMonth;

/// `2025-11`, or `2025-11 to 2026-01` for a run of months.
pub fn months_label(months: &[YearMonth]) -> String {
    match (months.first(), months.last()) {
        (Some(first), Some(last)) if first != last => format!("{first} to {last}"),
        (Some(first), _) => first.to_string(),
        _ => String::new(),
    }
}

/// Non-zero exit when any target could not be opened or listed.
pub fn exit_status(failed_targets: usize) -> Result<()> {
    match failed_targets {
        0 => Ok(()),
        1 => bail!("1 sync target failed"),
        n => bail!("{n} sync targets failed"),
    }
}
