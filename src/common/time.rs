//! Time-related utilities.
//!
//! Timestamps are Unix milliseconds in UTC. They only carry presence metadata
//! (when a participant connected) and are surfaced by the inspection API.

use chrono::{TimeZone, Utc};

/// Get current Unix timestamp in UTC (milliseconds)
pub fn now_unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to UTC RFC 3339 format
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    let seconds = timestamp_millis / 1000;
    let nanos = ((timestamp_millis % 1000) * 1_000_000) as u32;
    match Utc.timestamp_opt(seconds, nanos) {
        chrono::LocalResult::Single(dt) => dt.to_rfc3339(),
        _ => String::from("invalid-timestamp"),
    }
}
