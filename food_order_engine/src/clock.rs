//! Time sources and the local business timezone.
//!
//! Business rules such as "cancel orders that have been pending for more than 30 minutes" are expressed in local
//! wall-clock terms. Order timestamps are stored in UTC, so every elapsed-time check converts both ends to the
//! [`LocalTimezone`] before subtracting.
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use thiserror::Error;

/// Vietnam (ICT) is UTC+7 all year round.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Supplies the current time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Error)]
#[error("{0} hours is not a valid UTC offset")]
pub struct InvalidUtcOffset(i32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTimezone {
    offset: FixedOffset,
}

impl Default for LocalTimezone {
    fn default() -> Self {
        let offset = FixedOffset::east_opt(DEFAULT_UTC_OFFSET_HOURS * 3600).unwrap_or_else(|| Utc.fix());
        Self { offset }
    }
}

impl LocalTimezone {
    pub fn from_utc_offset_hours(hours: i32) -> Result<Self, InvalidUtcOffset> {
        hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or(InvalidUtcOffset(hours))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn to_local(&self, t: DateTime<Utc>) -> DateTime<FixedOffset> {
        t.with_timezone(&self.offset)
    }

    /// The local wall-clock time that has passed between `then` and `now`.
    pub fn elapsed(&self, now: DateTime<Utc>, then: DateTime<Utc>) -> Duration {
        self.to_local(now).signed_duration_since(self.to_local(then))
    }

    /// The calendar date of `t` in local time.
    pub fn local_date(&self, t: DateTime<Utc>) -> NaiveDate {
        self.to_local(t).date_naive()
    }

    /// Parses a timestamp written by an admin. Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS` (or with a
    /// space) timestamps in local time, and plain `YYYY-MM-DD` dates, which mean local midnight.
    pub fn parse_local(&self, s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        let naive = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .or_else(|| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0)))?;
        self.offset.from_local_datetime(&naive).single().map(|dt| dt.with_timezone(&Utc))
    }
}
