//! Transport header parsing.

pub mod header;

pub use header::{extract_address, parse_date, HeaderBlock};
