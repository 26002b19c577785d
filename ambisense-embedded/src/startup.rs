use core::fmt;
use core::net::Ipv4Addr;

use ambisense_api::{AnonymousAuth, WallClock, is_clock_synced};
use embedded_hal::delay::DelayNs;
use log::{error, info};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Wi-Fi join polling period.
pub const NETWORK_POLL_INTERVAL_MS: u32 = 300;

/// SNTP polling period.
pub const TIME_SYNC_POLL_INTERVAL_MS: u32 = 500;

/// How long a blocking startup step keeps polling its condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RetryPolicy {
    /// Poll at a fixed interval until the condition holds.
    Forever { interval_ms: u32 },
    /// Give up after `max_attempts` failed checks, doubling the wait each time.
    Bounded {
        max_attempts: u32,
        initial_interval_ms: u32,
        max_interval_ms: u32,
    },
}

impl RetryPolicy {
    pub const fn forever(interval_ms: u32) -> Self {
        RetryPolicy::Forever { interval_ms }
    }

    /// Wait before the next check after `failures` failed checks, or `None`
    /// once the policy is exhausted.
    pub fn next_delay(&self, failures: u32) -> Option<u32> {
        match *self {
            RetryPolicy::Forever { interval_ms } => Some(interval_ms),
            RetryPolicy::Bounded {
                max_attempts,
                initial_interval_ms,
                max_interval_ms,
            } => {
                if failures >= max_attempts {
                    return None;
                }

                let shift = failures.saturating_sub(1).min(31);
                let backoff = initial_interval_ms.saturating_mul(1u32 << shift);
                Some(backoff.min(max_interval_ms))
            }
        }
    }
}

/// Outcome of the startup sequence, read-only afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub wifi_connected: bool,
    pub firebase_authed: bool,
}

pub trait NetworkLink {
    type Error: fmt::Debug;

    fn begin(&mut self, ssid: &str, password: &str) -> core::result::Result<(), Self::Error>;

    fn is_connected(&mut self) -> bool;

    fn local_ip(&self) -> Option<Ipv4Addr>;
}

/// Polls `check` until it holds, sleeping as the policy says between checks.
/// Returns the number of failed checks.
pub fn retry_until<D, F>(
    operation: &'static str,
    policy: RetryPolicy,
    delay: &mut D,
    mut check: F,
) -> Result<u32>
where
    D: DelayNs,
    F: FnMut() -> bool,
{
    let mut failures = 0u32;

    while !check() {
        failures = failures.saturating_add(1);

        match policy.next_delay(failures) {
            Some(wait_ms) => delay.delay_ms(wait_ms),
            None => {
                error!("{} gave up after {} attempts", operation, failures);
                return Err(Error::RetriesExhausted {
                    operation,
                    attempts: failures,
                });
            }
        }
    }

    Ok(failures)
}

pub fn connect_network<L, D>(
    link: &mut L,
    ssid: &str,
    password: &str,
    policy: RetryPolicy,
    delay: &mut D,
) -> Result<()>
where
    L: NetworkLink,
    D: DelayNs,
{
    info!("Connecting to Wi-Fi {}", ssid);

    link.begin(ssid, password).map_err(|e| {
        error!("Failed to start Wi-Fi: {:?}", e);
        Error::NetworkUnavailable
    })?;

    let failures = retry_until("Wi-Fi join", policy, delay, || link.is_connected())?;

    match link.local_ip() {
        Some(ip) => info!("Connected with IP: {} after {} polls", ip, failures),
        None => info!("Connected after {} polls", failures),
    }

    Ok(())
}

/// Blocks until the wall clock has been set by SNTP and returns the synced UTC time.
pub fn wait_for_time_sync<C, D>(clock: &C, policy: RetryPolicy, delay: &mut D) -> Result<OffsetDateTime>
where
    C: WallClock,
    D: DelayNs,
{
    info!("Waiting for NTP time sync");

    retry_until("NTP time sync", policy, delay, || {
        is_clock_synced(clock.now_utc())
    })?;

    let now = clock.now_utc();
    info!("Current time: {} UTC", now);

    Ok(now)
}

/// Anonymous sign-up, attempted once. Failure is reported, never retried.
pub fn authenticate<S>(store: &mut S) -> Result<()>
where
    S: AnonymousAuth,
{
    match store.sign_up() {
        Ok(()) => {
            info!("Firebase sign-up ok");
            Ok(())
        }
        Err(err) => {
            error!("Firebase sign-up failed: {}", err);
            Err(Error::Store(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockClock, MockDelay, MockLink, MockStore};

    #[test]
    fn test_bounded_backoff() {
        let policy = RetryPolicy::Bounded {
            max_attempts: 5,
            initial_interval_ms: 100,
            max_interval_ms: 500,
        };

        assert_eq!(policy.next_delay(1), Some(100));
        assert_eq!(policy.next_delay(2), Some(200));
        assert_eq!(policy.next_delay(3), Some(400));
        assert_eq!(policy.next_delay(4), Some(500));
        assert_eq!(policy.next_delay(5), None);
    }

    #[test]
    fn test_forever_policy_never_exhausts() {
        let policy = RetryPolicy::forever(NETWORK_POLL_INTERVAL_MS);
        assert_eq!(policy.next_delay(u32::MAX), Some(300));
    }

    #[test]
    fn test_connect_network_polls_until_joined() {
        let mut link = MockLink::connecting_after(3);
        let mut delay = MockDelay::default();

        connect_network(
            &mut link,
            "ssid",
            "secret",
            RetryPolicy::forever(NETWORK_POLL_INTERVAL_MS),
            &mut delay,
        )
        .unwrap();

        assert_eq!(link.credentials.as_ref().unwrap().0, "ssid");
        assert_eq!(delay.calls, [300, 300, 300]);
    }

    #[test]
    fn test_connect_network_gives_up() {
        let mut link = MockLink::connecting_after(u32::MAX);
        let mut delay = MockDelay::default();
        let policy = RetryPolicy::Bounded {
            max_attempts: 3,
            initial_interval_ms: 50,
            max_interval_ms: 1000,
        };

        let err = connect_network(&mut link, "ssid", "secret", policy, &mut delay).unwrap_err();

        assert_eq!(
            err,
            Error::RetriesExhausted {
                operation: "Wi-Fi join",
                attempts: 3
            }
        );
        assert_eq!(delay.calls, [50, 100]);
    }

    #[test]
    fn test_wait_for_time_sync() {
        let clock = MockClock::at(1_000);
        clock.advance_on_read(10_000);
        let mut delay = MockDelay::default();

        let now = wait_for_time_sync(
            &clock,
            RetryPolicy::forever(TIME_SYNC_POLL_INTERVAL_MS),
            &mut delay,
        )
        .unwrap();

        assert!(is_clock_synced(now));
        assert_eq!(delay.calls, [500, 500, 500, 500, 500, 500]);
    }

    #[test]
    fn test_authenticate_failure_is_reported() {
        let mut store = MockStore::default();
        store.sign_up_error = Some(ambisense_api::StoreError::new("OPERATION_NOT_ALLOWED", 400));

        assert!(matches!(authenticate(&mut store), Err(Error::Store(_))));

        store.sign_up_error = None;
        assert!(authenticate(&mut store).is_ok());
    }
}
