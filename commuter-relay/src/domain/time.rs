//! Wall-clock time handling.
//!
//! Schedule rules carry their window bounds as zero-padded "HH:MM" strings,
//! and the device displays departures as "HH:MM" in the local time zone.
//! This module provides a validated time-of-day type for the former and the
//! epoch rendering for the latter.

use std::fmt;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid "HH:MM" string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid clock time: {reason}")]
pub struct InvalidClockTime {
    reason: &'static str,
}

impl InvalidClockTime {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day with minute precision.
///
/// Ordering matches the lexicographic ordering of the zero-padded "HH:MM"
/// form, so comparisons agree with the string comparison the device
/// configuration page relies on.
///
/// # Examples
///
/// ```
/// use commuter_relay::domain::ClockTime;
///
/// let start = ClockTime::parse_hhmm("07:30").unwrap();
/// let end = ClockTime::parse_hhmm("09:00").unwrap();
/// assert!(start < end);
/// assert_eq!(start.to_string(), "07:30");
///
/// assert!(ClockTime::parse_hhmm("7:30").is_err());
/// assert!(ClockTime::parse_hhmm("24:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Create a clock time from components, if they are in range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    /// Parse a time from "HH:MM" format.
    pub fn parse_hhmm(s: &str) -> Result<Self, InvalidClockTime> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(InvalidClockTime::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(InvalidClockTime::new("expected colon at position 2"));
        }

        let hour = parse_two_digits(&bytes[0..2])
            .ok_or_else(|| InvalidClockTime::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(InvalidClockTime::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| InvalidClockTime::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(InvalidClockTime::new("minute must be 0-59"));
        }

        Ok(Self { hour, minute })
    }

    /// Truncate a time of day to minute precision.
    pub fn from_time(time: NaiveTime) -> Self {
        // hour() and minute() are always in range
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }
}

impl TryFrom<String> for ClockTime {
    type Error = InvalidClockTime;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hhmm(&value)
    }
}

impl std::str::FromStr for ClockTime {
    type Err = InvalidClockTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hhmm(s)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({:02}:{:02})", self.hour, self.minute)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Convert Unix epoch seconds to a local date-time in `tz`.
///
/// Out-of-range timestamps fall back to the epoch itself.
pub fn epoch_to_local(epoch_secs: i64, tz: Tz) -> DateTime<Tz> {
    DateTime::<Utc>::from_timestamp(epoch_secs, 0)
        .unwrap_or_default()
        .with_timezone(&tz)
}

/// Render Unix epoch seconds as "HH:MM" in `tz`.
pub fn format_epoch_hhmm(epoch_secs: i64, tz: Tz) -> String {
    let local = epoch_to_local(epoch_secs, tz);
    ClockTime::from_time(local.time()).to_string()
}

/// Parse two ASCII digit bytes into a u8.
fn parse_two_digits(bytes: &[u8]) -> Option<u8> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some((d1 * 10 + d2) as u8)
}
