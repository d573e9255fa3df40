//! Time utilities for response and webhook timestamps.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// RFC 3339 with whole seconds, as used in `created` / `updated` fields.
pub fn format_rfc3339(timestamp: Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// RFC 3339 with nanosecond precision, used to seed generated external ids.
pub fn format_rfc3339_nanos(timestamp: Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// End of a retry window that opened at `start`.
///
/// Returns `None` when the window end is outside the representable range.
pub fn window_end(start: Timestamp, minutes: i64) -> Option<Timestamp> {
    Duration::try_minutes(minutes).and_then(|window| start.checked_add_signed(window))
}
