//! Wall-clock helpers for per-object and whole-state modification stamps.

use chrono::{DateTime, SecondsFormat, Utc};

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

/// A modification stamp strictly greater than `previous`.
///
/// Keeps per-object `lastModified` monotonic even when two edits land in the
/// same millisecond or the wall clock steps backwards.
pub fn next_after(previous: u64) -> u64 {
    now_millis().max(previous.saturating_add(1))
}

/// Current time as an ISO-8601 UTC string with millisecond precision,
/// e.g. `2024-05-01T12:30:00.000Z`.
pub fn iso_now() -> String {
    to_iso(Utc::now())
}

/// Format a timestamp the way whole-state `lastModified` values are stored.
pub fn to_iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
