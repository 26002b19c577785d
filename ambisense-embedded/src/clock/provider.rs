use std::time::{Duration, Instant};

use ambisense_api::{TimeProvider, WallClock};
use embedded_hal::delay::DelayNs;
use time::OffsetDateTime;

/// Milliseconds since construction, from the monotonic clock.
pub struct SystemTimeProvider {
    boot_time: Instant,
}

impl SystemTimeProvider {
    pub fn new() -> Self {
        Self {
            boot_time: Instant::now(),
        }
    }
}

impl Default for SystemTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeProvider for SystemTimeProvider {
    fn uptime_ms(&self) -> u64 {
        self.boot_time.elapsed().as_millis() as u64
    }
}

/// System wall clock. On ESP-IDF this is the time SNTP keeps in sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now_utc(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Blocking delay that parks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uptime_advances() {
        let provider = SystemTimeProvider::new();
        let start = provider.uptime_ms();

        StdDelay.delay_ms(5);

        assert!(provider.uptime_ms() >= start + 5);
    }

    #[test]
    fn test_system_clock_is_synced_on_host() {
        assert!(ambisense_api::is_clock_synced(SystemClock.now_utc()));
    }
}
