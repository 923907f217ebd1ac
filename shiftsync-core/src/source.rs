//! The read side of a sync: where shifts come from.

use async_trait::async_trait;

use crate::error::SourceError;
use crate::shift::ShiftRecord;
use crate::window::YearMonth;

/// A shift-management site (or anything else) that publishes shifts per month.
#[async_trait]
pub trait ShiftSource: Send + Sync {
    /// Every well-formed shift published for `month`. Rows that cannot be
    /// turned into a [`ShiftRecord`] are dropped, not reported.
    async fn fetch_month(&self, month: YearMonth) -> Result<Vec<ShiftRecord>, SourceError>;
}
