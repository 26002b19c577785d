use core::cell::Cell;
use core::net::Ipv4Addr;

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use ambisense_api::{AnonymousAuth, RealtimeStore, RemotePath, StoreError, StoreResult, WallClock};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};
use time::OffsetDateTime;

use crate::sensor::{AdcChannel, AnalogInput, Hygrometer};
use crate::startup::NetworkLink;

#[derive(Debug)]
pub struct MockAnalog {
    pub value: u16,
}

impl AnalogInput for MockAnalog {
    fn read_raw(&mut self) -> u16 {
        self.value
    }
}

/// ADC channel that plays back scripted conversions, failing once they run out.
#[derive(Debug)]
pub struct MockAdc {
    conversions: VecDeque<Result<u16, ()>>,
}

impl MockAdc {
    pub fn new<const N: usize>(conversions: [Result<u16, ()>; N]) -> Self {
        Self {
            conversions: conversions.into_iter().collect(),
        }
    }
}

impl AdcChannel for MockAdc {
    type Error = ();

    fn try_read(&mut self) -> Result<u16, Self::Error> {
        self.conversions.pop_front().unwrap_or(Err(()))
    }
}

#[derive(Debug)]
pub struct MockHygrometer {
    pub temperature: Result<f32, ()>,
    pub humidity: Result<f32, ()>,
}

impl MockHygrometer {
    pub fn new(temperature: Result<f32, ()>, humidity: Result<f32, ()>) -> Self {
        Self {
            temperature,
            humidity,
        }
    }
}

impl Hygrometer for MockHygrometer {
    type Error = ();

    fn read_temperature(&mut self) -> Result<f32, Self::Error> {
        self.temperature
    }

    fn read_humidity(&mut self) -> Result<f32, Self::Error> {
        self.humidity
    }
}

#[derive(Debug)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
pub struct MockPin {
    pub high: Option<bool>,
    pub writes: usize,
    fail: bool,
}

impl MockPin {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn drive(&mut self, high: bool) -> Result<(), MockPinError> {
        if self.fail {
            return Err(MockPinError);
        }
        self.high = Some(high);
        self.writes += 1;
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

/// In-memory store that records every call.
#[derive(Debug)]
pub struct MockStore {
    pub ready: bool,
    pub led: StoreResult<bool>,
    pub sign_up_error: Option<StoreError>,
    pub writes: Vec<(String, f32)>,
    pub reads: Vec<String>,
    pub log: Vec<String>,
    failures: Vec<(String, StoreError)>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self {
            ready: false,
            led: Ok(false),
            sign_up_error: None,
            writes: Vec::new(),
            reads: Vec::new(),
            log: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl MockStore {
    pub fn ready() -> Self {
        Self {
            ready: true,
            ..Self::default()
        }
    }

    pub fn fail_path(&mut self, path: &str, error: StoreError) {
        self.failures.push((path.to_string(), error));
    }
}

impl RealtimeStore for MockStore {
    fn is_ready(&mut self) -> bool {
        self.ready
    }

    fn set_float(&mut self, path: &RemotePath, value: f32) -> StoreResult<()> {
        self.log.push(format!("set {}", path));

        if let Some((_, err)) = self.failures.iter().find(|(p, _)| p == path.as_str()) {
            return Err(err.clone());
        }

        self.writes.push((path.to_string(), value));
        Ok(())
    }

    fn get_bool(&mut self, path: &RemotePath) -> StoreResult<bool> {
        self.log.push(format!("get {}", path));
        self.reads.push(path.to_string());
        self.led.clone()
    }
}

impl AnonymousAuth for MockStore {
    fn sign_up(&mut self) -> StoreResult<()> {
        match &self.sign_up_error {
            Some(err) => Err(err.clone()),
            None => {
                self.ready = true;
                Ok(())
            }
        }
    }
}

/// Wall clock pinned to a unix time, optionally advancing on every read.
#[derive(Debug)]
pub struct MockClock {
    unix_secs: Cell<i64>,
    step_secs: Cell<i64>,
}

impl MockClock {
    pub fn at(unix_secs: i64) -> Self {
        Self {
            unix_secs: Cell::new(unix_secs),
            step_secs: Cell::new(0),
        }
    }

    pub fn advance_on_read(&self, step_secs: i64) {
        self.step_secs.set(step_secs);
    }
}

impl WallClock for MockClock {
    fn now_utc(&self) -> OffsetDateTime {
        let now = self.unix_secs.get();
        self.unix_secs.set(now + self.step_secs.get());
        OffsetDateTime::from_unix_timestamp(now).unwrap()
    }
}

#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls: Vec<u32>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
    }
}

#[derive(Debug, Default)]
pub struct MockLink {
    pub credentials: Option<(String, String)>,
    polls_until_connected: u32,
    polls: u32,
}

impl MockLink {
    pub fn connecting_after(polls: u32) -> Self {
        Self {
            polls_until_connected: polls,
            ..Self::default()
        }
    }
}

impl NetworkLink for MockLink {
    type Error = ();

    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), Self::Error> {
        self.credentials = Some((ssid.to_string(), password.to_string()));
        Ok(())
    }

    fn is_connected(&mut self) -> bool {
        if self.polls >= self.polls_until_connected {
            return true;
        }
        self.polls += 1;
        false
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        (self.polls >= self.polls_until_connected).then(|| Ipv4Addr::new(192, 168, 1, 42))
    }
}
