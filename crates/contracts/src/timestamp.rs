//! Timestamp - changefeed event ordering key
//!
//! Wire form (33 ASCII digits):
//!
//! ```text
//! YYYYMMDDHHMMSS NNNNNNNNN LLLLLLLLLL
//! └─ wall time ┘ └ nanos ┘ └ logical ┘
//! ```

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Timelike, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

/// Length of the wall time block (calendar seconds + nanoseconds)
pub const WALL_TIME_LEN: usize = 23;

/// Length of the logical counter block
pub const LOGICAL_LEN: usize = 10;

/// Length of the full wire encoding
pub const WIRE_LEN: usize = WALL_TIME_LEN + LOGICAL_LEN;

const DATETIME_LEN: usize = 14;
const NANOS_PER_SEC: i128 = 1_000_000_000;
const MAX_LOGICAL: u64 = 9_999_999_999;

/// Malformed timestamp input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    /// Input block has the wrong length
    #[error("malformed timestamp: {part} must be {expected} characters, got {actual}: {input:?}")]
    Length {
        part: &'static str,
        expected: usize,
        actual: usize,
        input: String,
    },

    /// Input block contains something other than ASCII digits
    #[error("malformed timestamp: {part} is not numeric: {input:?}")]
    NotNumeric { part: &'static str, input: String },

    /// Digits decode to an impossible value (month 13, hour 24, ...)
    #[error("malformed timestamp: {part} out of range: {input:?}")]
    OutOfRange { part: &'static str, input: String },
}

impl TimestampError {
    fn out_of_range(part: &'static str, input: impl Into<String>) -> Self {
        Self::OutOfRange {
            part,
            input: input.into(),
        }
    }
}

/// MVCC-style changefeed timestamp.
///
/// Ordered by wall time, then nanoseconds, then the logical counter. Staged
/// mutations are applied up to a resolved checkpoint in this order, so the
/// field order below is load-bearing for the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// UTC wall time at second resolution
    wall_time: DateTime<Utc>,
    /// Sub-second offset, 0..=999_999_999
    nanos: u32,
    /// Tie breaker, 0..=9_999_999_999
    logical: u64,
}

impl Timestamp {
    /// Decode the 23-digit wall time block and the 10-digit logical block.
    ///
    /// # Errors
    /// Returns [`TimestampError`] on wrong lengths, non-digit characters or
    /// calendar fields out of range.
    pub fn decode(datetime: &str, logical: &str) -> Result<Self, TimestampError> {
        check_len("datetime", datetime, WALL_TIME_LEN)?;
        check_len("logical", logical, LOGICAL_LEN)?;
        check_digits("datetime", datetime)?;
        check_digits("logical", logical)?;

        let (calendar, nanos) = datetime.split_at(DATETIME_LEN);
        let wall_time = parse_calendar(calendar)?;
        let nanos: u32 = parse_number("nanos", nanos)?;
        let logical_value: u64 = parse_number("logical", logical)?;

        trace!(
            calendar,
            wall_time = %wall_time,
            nanos,
            logical = logical_value,
            "Decoded timestamp"
        );

        Ok(Self {
            wall_time,
            nanos,
            logical: logical_value,
        })
    }

    /// Build a timestamp from nanoseconds since the Unix epoch.
    ///
    /// Changefeed records carry their `updated` time in this form.
    pub fn from_unix_nanos(unix_nanos: i128, logical: u64) -> Result<Self, TimestampError> {
        let secs = i64::try_from(unix_nanos.div_euclid(NANOS_PER_SEC))
            .map_err(|_| TimestampError::out_of_range("wall time", unix_nanos.to_string()))?;
        let nanos = unix_nanos.rem_euclid(NANOS_PER_SEC) as u32;

        let wall_time = DateTime::from_timestamp(secs, 0)
            .filter(|t| (0..=9999).contains(&t.year()))
            .ok_or_else(|| TimestampError::out_of_range("wall time", unix_nanos.to_string()))?;

        if logical > MAX_LOGICAL {
            return Err(TimestampError::out_of_range("logical", logical.to_string()));
        }

        Ok(Self {
            wall_time,
            nanos,
            logical,
        })
    }

    /// Wall time truncated to seconds
    pub fn wall_time(&self) -> DateTime<Utc> {
        self.wall_time
    }

    /// Sub-second nanoseconds
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Logical counter
    pub fn logical(&self) -> u64 {
        self.logical
    }

    /// Wall time with full sub-second precision
    pub fn to_datetime(&self) -> DateTime<Utc> {
        self.wall_time + TimeDelta::nanoseconds(i64::from(self.nanos))
    }

    /// Nanoseconds since the Unix epoch
    pub fn unix_nanos(&self) -> i128 {
        i128::from(self.wall_time.timestamp()) * NANOS_PER_SEC + i128::from(self.nanos)
    }
}

impl fmt::Display for Timestamp {
    /// Re-encodes the 33-digit wire form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.wall_time;
        write!(
            f,
            "{:04}{:02}{:02}{:02}{:02}{:02}{:09}{:010}",
            t.year(),
            t.month(),
            t.day(),
            t.hour(),
            t.minute(),
            t.second(),
            self.nanos,
            self.logical
        )
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    /// Parse the full 33-digit wire form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        check_len("timestamp", s, WIRE_LEN)?;
        check_digits("timestamp", s)?;
        let (datetime, logical) = s.split_at(WALL_TIME_LEN);
        Self::decode(datetime, logical)
    }
}

fn check_len(part: &'static str, input: &str, expected: usize) -> Result<(), TimestampError> {
    if input.len() != expected {
        return Err(TimestampError::Length {
            part,
            expected,
            actual: input.len(),
            input: input.to_string(),
        });
    }
    Ok(())
}

/// Integer parsers accept a leading sign; the wire form does not.
fn check_digits(part: &'static str, input: &str) -> Result<(), TimestampError> {
    if !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimestampError::NotNumeric {
            part,
            input: input.to_string(),
        });
    }
    Ok(())
}

fn parse_number<T: FromStr>(part: &'static str, digits: &str) -> Result<T, TimestampError> {
    digits.parse().map_err(|_| TimestampError::NotNumeric {
        part,
        input: digits.to_string(),
    })
}

/// `YYYYMMDDHHMMSS`, UTC
fn parse_calendar(calendar: &str) -> Result<DateTime<Utc>, TimestampError> {
    let year: i32 = parse_number("year", &calendar[0..4])?;
    let month: u32 = parse_number("month", &calendar[4..6])?;
    let day: u32 = parse_number("day", &calendar[6..8])?;
    let hour: u32 = parse_number("hour", &calendar[8..10])?;
    let minute: u32 = parse_number("minute", &calendar[10..12])?;
    let second: u32 = parse_number("second", &calendar[12..14])?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TimestampError::out_of_range("datetime", calendar))
}
