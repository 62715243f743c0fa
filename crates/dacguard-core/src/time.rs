//! Wall-clock helpers. All timestamps are Unix milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Current time in milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

pub fn hours_to_millis(hours: u32) -> i64 {
    i64::from(hours) * MILLIS_PER_HOUR
}
