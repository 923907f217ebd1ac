//! ShiftWeb staff portal as a shiftsync [`ShiftSource`](shiftsync_core::ShiftSource).
//!
//! The portal has no API: we log in with a cookie session and scrape the
//! monthly "look" page.

mod client;
mod parse;
mod source;

pub use client::ShiftWebClient;
pub use parse::parse_shifts;
pub use source::ShiftWebSource;
