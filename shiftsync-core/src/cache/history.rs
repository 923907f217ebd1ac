use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::write_atomic;
use crate::error::{CoreError, CoreResult};
use crate::sync::SyncResult;

const HISTORY_FILE: &str = "history.json";

/// Summary of one sync of one calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub target: String,
    pub months: String,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
    #[serde(default)]
    pub duplicates_removed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryEntry {
    pub fn from_result(at: DateTime<Utc>, target: &str, months: &str, result: &SyncResult) -> Self {
        HistoryEntry {
            at,
            target: target.to_string(),
            months: months.to_string(),
            added: result.added(),
            updated: result.updated_count(),
            deleted: result.deleted_count(),
            failed: result.failed_count(),
            duplicates_removed: result.duplicates_removed,
            error: None,
        }
    }

    pub fn from_error(at: DateTime<Utc>, target: &str, months: &str, error: &str) -> Self {
        HistoryEntry {
            at,
            target: target.to_string(),
            months: months.to_string(),
            added: 0,
            updated: 0,
            deleted: 0,
            failed: 0,
            duplicates_removed: 0,
            error: Some(error.to_string()),
        }
    }
}

/// Bounded list of recent runs, oldest first.
pub struct History {
    path: PathBuf,
    limit: usize,
}

impl History {
    pub fn new(path: impl Into<PathBuf>, limit: usize) -> Self {
        History {
            path: path.into(),
            limit: limit.max(1),
        }
    }

    pub fn in_dir(data_dir: &Path, limit: usize) -> Self {
        Self::new(data_dir.join(HISTORY_FILE), limit)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Vec<HistoryEntry> {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "ignoring corrupt history: {e}");
            Vec::new()
        })
    }

    /// Append entries, dropping the oldest beyond the limit.
    pub fn record(&self, entries: impl IntoIterator<Item = HistoryEntry>) -> CoreResult<()> {
        let mut all = self.load();
        all.extend(entries);
        if all.len() > self.limit {
            all.drain(..all.len() - self.limit);
        }

        let content =
            serde_json::to_string_pretty(&all).map_err(|e| CoreError::Serialization(e.to_string()))?;
        write_atomic(&self.path, &content)
    }
}
