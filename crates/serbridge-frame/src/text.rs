use std::fmt::Display;

use chrono::{DateTime, TimeZone};

/// Prefix put in front of every logged line: `[YYYY-MM-DD HH:MM:SS.mmm] `.
pub const TIMESTAMP_FORMAT: &str = "[%Y-%m-%d %H:%M:%S%.3f] ";

const TRAILING_WHITESPACE: &[char] = &[' ', '\t', '\r', '\n'];

/// Longest valid UTF-8 prefix of `bytes`.
///
/// Serial lines may end in the middle of a multi-byte sequence (or contain
/// garbage); the text is cut back to the last point where it is valid.
pub fn coerce_utf8(bytes: &[u8]) -> &str {
    match std::str::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => std::str::from_utf8(&bytes[..err.valid_up_to()]).unwrap_or_default(),
    }
}

/// Strip trailing whitespace and prefix the text with its timestamp.
pub fn format_log_line<Tz>(started_at: &DateTime<Tz>, text: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}{}",
        started_at.format(TIMESTAMP_FORMAT),
        text.trim_end_matches(TRAILING_WHITESPACE)
    )
}
