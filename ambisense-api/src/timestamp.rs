use core::fmt;

use alloc::format;
use alloc::string::String;

use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// India Standard Time, UTC+5:30.
pub const LOCAL_UTC_OFFSET_SECONDS: i32 = 19_800;

pub const DAYLIGHT_OFFSET_SECONDS: i32 = 0;

/// A clock reading below this many seconds after the epoch has not been set by NTP yet.
pub const SYNCED_EPOCH_THRESHOLD_SECS: i64 = 8 * 3600 * 2;

/// Length of `YYYY-MM-DD_HH-MM-SS`.
pub const TIMESTAMP_LEN: usize = 19;

/// Wall-clock source. On the device this is the SNTP-disciplined system time.
pub trait WallClock {
    fn now_utc(&self) -> OffsetDateTime;
}

impl<T: WallClock + ?Sized> WallClock for &T {
    fn now_utc(&self) -> OffsetDateTime {
        (**self).now_utc()
    }
}

/// Fixed local offset built from a GMT offset and a daylight offset, both in seconds.
///
/// Out-of-range sums (beyond ±25h) fall back to UTC.
pub fn local_offset(gmt_offset_secs: i32, daylight_offset_secs: i32) -> UtcOffset {
    UtcOffset::from_whole_seconds(gmt_offset_secs.saturating_add(daylight_offset_secs))
        .unwrap_or(UtcOffset::UTC)
}

pub fn is_clock_synced(now: OffsetDateTime) -> bool {
    now.unix_timestamp() >= SYNCED_EPOCH_THRESHOLD_SECS
}

/// Local time rendered as `YYYY-MM-DD_HH-MM-SS`, used as a database key segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(String);

impl Timestamp {
    pub fn from_datetime(datetime: OffsetDateTime, offset: UtcOffset) -> Self {
        let local = datetime.to_offset(offset);

        Self(format!(
            "{:04}-{:02}-{:02}_{:02}-{:02}-{:02}",
            local.year(),
            u8::from(local.month()),
            local.day(),
            local.hour(),
            local.minute(),
            local.second()
        ))
    }

    /// Parses a key produced by [`Timestamp::from_datetime`].
    pub fn parse(value: &str) -> Option<Self> {
        Self::to_datetime(value, UtcOffset::UTC).map(|_| Self(String::from(value)))
    }

    /// Interprets the key as local time at `offset`.
    pub fn to_datetime(value: &str, offset: UtcOffset) -> Option<OffsetDateTime> {
        let bytes = value.as_bytes();
        if bytes.len() != TIMESTAMP_LEN {
            return None;
        }

        let separators = [(4, b'-'), (7, b'-'), (10, b'_'), (13, b'-'), (16, b'-')];
        if separators.iter().any(|&(index, sep)| bytes[index] != sep) {
            return None;
        }

        let number = |start: usize, end: usize| -> Option<u16> {
            let digits = value.get(start..end)?;
            if !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            digits.parse().ok()
        };

        let year = number(0, 4)? as i32;
        let month = Month::try_from(number(5, 7)? as u8).ok()?;
        let day = number(8, 10)? as u8;
        let hour = number(11, 13)? as u8;
        let minute = number(14, 16)? as u8;
        let second = number(17, 19)? as u8;

        let date = Date::from_calendar_date(year, month, day).ok()?;
        let time = Time::from_hms(hour, minute, second).ok()?;

        Some(PrimitiveDateTime::new(date, time).assume_offset(offset))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
