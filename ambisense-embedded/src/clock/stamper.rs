use ambisense_api::{Timestamp, WallClock, is_clock_synced, local_offset};
use time::{OffsetDateTime, UtcOffset};

/// Renders the wall clock as database keys at a fixed local offset.
pub struct TimeStamper<C>
where
    C: WallClock,
{
    clock: C,
    offset: UtcOffset,
}

impl<C> TimeStamper<C>
where
    C: WallClock,
{
    pub fn new(clock: C, gmt_offset_secs: i32, daylight_offset_secs: i32) -> Self {
        Self {
            clock,
            offset: local_offset(gmt_offset_secs, daylight_offset_secs),
        }
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    pub fn now_utc(&self) -> OffsetDateTime {
        self.clock.now_utc()
    }

    pub fn is_synced(&self) -> bool {
        is_clock_synced(self.clock.now_utc())
    }

    /// An unsynchronized clock still yields a (1970) timestamp.
    pub fn now_timestamp(&self) -> Timestamp {
        Timestamp::from_datetime(self.clock.now_utc(), self.offset)
    }
}
