//! Reconciliation of desired shifts against a calendar store.

pub mod dedup;
mod diff_kind;
mod plan;
mod reconciler;
mod result;
mod shift_diff;

pub use dedup::{DedupOutcome, Resolution};
pub use diff_kind::DiffKind;
pub use plan::SyncPlan;
pub use reconciler::Reconciler;
pub use result::{BatchResult, FailedChange, SyncResult};
pub use shift_diff::ShiftDiff;
