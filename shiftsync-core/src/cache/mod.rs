//! Local, advisory state: the last synced shifts and a short run history.
//!
//! The calendar is the source of truth. Losing these files only means the
//! next run announces every shift as new and the history starts over.

mod history;
mod snapshot;

use std::path::Path;

use crate::error::CoreResult;

pub use history::{History, HistoryEntry};
pub use snapshot::{Snapshot, SnapshotCache, in_months};

/// Write through a temp file and rename, so readers never see half a file.
fn write_atomic(path: &Path, content: &str) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");

    std::fs::write(&temp, content)?;
    std::fs::rename(&temp, path)?;
    Ok(())
}
