/// User-facing formatting helpers (retry hints, durations, truncation).
pub mod formatting;
/// Pure parser helpers for configuration values.
pub mod parse;
