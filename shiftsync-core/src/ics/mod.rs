//! ICS generation and parsing.

mod generate;
mod parse;

pub use generate::{generate_export, generate_ics};
pub use parse::{ParsedEvent, parse_event};
