//! Service-day time handling.
//!
//! GTFS gives times as "HH:MM:SS" relative to the service day's nominal
//! midnight. Hours may run past 23 for trips continuing after midnight,
//! so times are kept as plain seconds rather than a wall-clock type.

use chrono::{NaiveTime, Timelike};

/// Seconds in one service day.
pub const SECS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Parse a GTFS "H:MM:SS" or "HH:MM:SS" time into seconds since midnight.
///
/// Hours above 23 are accepted.
///
/// # Examples
///
/// ```
/// use timetable_server::gtfs::parse_gtfs_time;
///
/// assert_eq!(parse_gtfs_time("08:00:00"), Ok(28800));
/// assert_eq!(parse_gtfs_time("27:00:00"), Ok(27 * 3600));
/// assert!(parse_gtfs_time("08:00").is_err());
/// ```
pub fn parse_gtfs_time(s: &str) -> Result<u32, TimeError> {
    let mut parts = s.trim().split(':');
    let (Some(h), Some(m), Some(sec), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TimeError::new("expected HH:MM:SS format"));
    };

    if h.is_empty() || h.len() > 3 || !h.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeError::new("invalid hour digits"));
    }
    let hour: u32 = h.parse().map_err(|_| TimeError::new("invalid hour digits"))?;

    let minute =
        parse_two_digits(m.as_bytes()).ok_or_else(|| TimeError::new("invalid minute digits"))?;
    if minute > 59 {
        return Err(TimeError::new("minute must be 0-59"));
    }

    let second =
        parse_two_digits(sec.as_bytes()).ok_or_else(|| TimeError::new("invalid second digits"))?;
    if second > 59 {
        return Err(TimeError::new("second must be 0-59"));
    }

    Ok(hour * 3600 + minute * 60 + second)
}

/// Render seconds since midnight as "HH:MM", wrapping hours past midnight.
///
/// ```
/// use timetable_server::gtfs::format_time;
///
/// assert_eq!(format_time(28800), "08:00");
/// assert_eq!(format_time(25 * 3600 + 5 * 60), "01:05");
/// ```
pub fn format_time(secs: u32) -> String {
    let hours = (secs / 3600) % 24;
    let minutes = (secs % 3600) / 60;
    format!("{hours:02}:{minutes:02}")
}

/// Render a duration in seconds as whole minutes, e.g. "10 min".
pub fn format_duration(secs: u32) -> String {
    format!("{} min", secs / 60)
}

/// Seconds since midnight for a wall-clock time.
pub fn seconds_of_day(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight()
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}
