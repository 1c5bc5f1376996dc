//! Shared utilities for the claims analytics crates.
//!
//! Value parsing used while loading raw extracts, text normalization for
//! categorical fields and descriptive statistics.

pub mod stats;
pub mod text;

pub use text::{capitalize, format_numeric, is_missing_token, parse_bool, parse_numeric};
