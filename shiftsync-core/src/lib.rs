//! Core of shiftsync: the shift model, its stable identity, and the engine
//! that reconciles a calendar store with a freshly scraped set of shifts.
//!
//! Adapters plug in through two traits:
//! - [`ShiftSource`](source::ShiftSource) produces shifts for a month
//! - [`CalendarStore`](remote::CalendarStore) lists and writes managed events

pub mod cache;
pub mod changes;
pub mod config;
pub mod constants;
pub mod error;
pub mod ics;
pub mod marker;
pub mod remote;
pub mod shift;
pub mod source;
pub mod sync;
pub mod window;

pub use error::{CoreError, CoreResult, MalformedRecord, SourceError, StoreError, StoreResult, SyncError};
pub use remote::{CalendarStore, MemoryStore, RemoteEvent};
pub use shift::{ShiftId, ShiftRecord};
pub use source::ShiftSource;
pub use sync::{Reconciler, SyncPlan, SyncResult};
pub use window::{MonthRange, SyncWindow, YearMonth};
