//! Canonical calendar-day keys for journal entries.
//!
//! An entry belongs to exactly one calendar day per owner. Clients send that
//! day either as a bare `YYYY-MM-DD` string or as a timestamp, and the day
//! key must come out the same no matter which timezone the server runs in:
//!
//! - a `YYYY-MM-DD` string is the day, taken verbatim;
//! - a timestamp with an offset is converted to UTC and its UTC date is used;
//! - a timestamp without an offset is read as UTC.
//!
//! Day keys are stored as plain dates with no time-of-day component, so
//! equality is exact and insensitive to the server's local zone.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use moodlog_common::AppError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static DATE_ONLY: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex")
});

/// Date input that cannot be turned into a day key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DayKeyError {
    #[error("Invalid calendar date: {0}")]
    InvalidDate(String),

    #[error("Unrecognized date format: {0}")]
    Unrecognized(String),

    #[error("Invalid month: {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
}

impl From<DayKeyError> for AppError {
    fn from(err: DayKeyError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// A calendar day with no time-of-day or timezone, formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// Build a key from year, month and day.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DayKeyError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| DayKeyError::InvalidDate(format!("{year:04}-{month:02}-{day:02}")))
    }

    /// The underlying date.
    #[must_use]
    pub const fn date(self) -> NaiveDate {
        self.0
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.0.year()
    }

    #[must_use]
    pub fn month(self) -> u32 {
        self.0.month()
    }

    /// First and last instant of the day in UTC.
    #[must_use]
    pub fn utc_bounds(self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.0.and_time(NaiveTime::MIN).and_utc();
        let end = self
            .0
            .and_hms_nano_opt(23, 59, 59, 999_999_999)
            .map_or(start, |t| t.and_utc());
        (start, end)
    }

    /// First and last day of a month, both inclusive.
    pub fn month_range(year: i32, month: u32) -> Result<(Self, Self), DayKeyError> {
        let invalid = || DayKeyError::InvalidMonth { year, month };

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;
        let last = next_month.pred_opt().ok_or_else(invalid)?;

        Ok((Self(first), Self(last)))
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Anything a client may send to name an entry's day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateLike {
    /// A date string or timestamp string.
    Text(String),
    /// A structured timestamp carrying its offset.
    Timestamp(DateTime<FixedOffset>),
    /// A structured calendar date.
    Date(NaiveDate),
}

impl From<&str> for DateLike {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DateLike {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDate> for DateLike {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateLike {
    fn from(ts: DateTime<Tz>) -> Self {
        Self::Timestamp(ts.fixed_offset())
    }
}

/// Compute the canonical day key for a client-supplied date.
pub fn canonical_day_key(input: impl Into<DateLike>) -> Result<DateKey, DayKeyError> {
    match input.into() {
        DateLike::Date(date) => Ok(DateKey(date)),
        DateLike::Timestamp(ts) => Ok(DateKey(ts.with_timezone(&Utc).date_naive())),
        DateLike::Text(text) => parse_text(text.trim()),
    }
}

fn parse_text(text: &str) -> Result<DateKey, DayKeyError> {
    if DATE_ONLY.is_match(text) {
        return NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(DateKey)
            .map_err(|_| DayKeyError::InvalidDate(text.to_string()));
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(DateKey(ts.with_timezone(&Utc).date_naive()));
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| DateKey(naive.date()))
        .map_err(|_| DayKeyError::Unrecognized(text.to_string()))
}
