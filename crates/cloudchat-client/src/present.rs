//! Small formatting helpers shared by front ends.

use chrono::{DateTime, Local, TimeZone, Utc};

/// First letter of the email, upper-cased, for the avatar circle.
pub fn avatar_initial(email: &str) -> char {
    email
        .chars()
        .next()
        .filter(|c| c.is_alphanumeric())
        .and_then(|c| c.to_uppercase().next())
        .unwrap_or('?')
}

/// Wall-clock time of a message in the local time zone, `HH:MM`.
pub fn format_clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

/// Same as [`format_clock`] for epoch-millisecond timestamps. Out-of-range
/// values render as `--:--`.
pub fn format_clock_millis(millis: i64) -> String {
    match Utc.timestamp_millis_opt(millis).single() {
        Some(ts) => format_clock(ts),
        None => "--:--".to_string(),
    }
}

/// Unread badge text; nothing when there is nothing unread.
pub fn unseen_badge(count: usize) -> Option<String> {
    match count {
        0 => None,
        1..=99 => Some(count.to_string()),
        _ => Some("99+".to_string()),
    }
}
