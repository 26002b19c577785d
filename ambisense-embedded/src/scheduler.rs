use ambisense_api::{RawSample, Readings, RealtimeStore, TimeProvider, WallClock};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use log::debug;

use crate::actuator::{ActuatorOutcome, ActuatorSync};
use crate::clock::TimeStamper;
use crate::publisher::{PublishReport, publish_readings};
use crate::sensor::{AnalogInput, Hygrometer, SensorReader};
use crate::startup::ConnectionState;

/// Minimum spacing between cycle starts.
pub const CYCLE_INTERVAL_MS: u64 = 5000;

pub const IDLE_POLL_INTERVAL_MS: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerState {
    pub last_cycle_start: Option<u64>,
}

impl SchedulerState {
    pub fn is_due(&self, now_ms: u64, interval_ms: u64) -> bool {
        match self.last_cycle_start {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= interval_ms,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub started_at_ms: u64,
    pub sample: RawSample,
    pub readings: Readings,
    pub publish: PublishReport,
    pub actuator: ActuatorOutcome,
}

pub struct CycleScheduler<A, H, C, P>
where
    A: AnalogInput,
    H: Hygrometer,
    C: WallClock,
    P: OutputPin,
{
    reader: SensorReader<A, H>,
    stamper: TimeStamper<C>,
    actuator: ActuatorSync<P>,
    connection: ConnectionState,
    state: SchedulerState,
    interval_ms: u64,
    poll_interval_ms: u32,
}

impl<A, H, C, P> CycleScheduler<A, H, C, P>
where
    A: AnalogInput,
    H: Hygrometer,
    C: WallClock,
    P: OutputPin,
{
    pub fn new(
        reader: SensorReader<A, H>,
        stamper: TimeStamper<C>,
        actuator: ActuatorSync<P>,
        connection: ConnectionState,
    ) -> Self {
        Self {
            reader,
            stamper,
            actuator,
            connection,
            state: SchedulerState::default(),
            interval_ms: CYCLE_INTERVAL_MS,
            poll_interval_ms: IDLE_POLL_INTERVAL_MS,
        }
    }

    pub fn with_interval(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval_ms: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn actuator(&self) -> &ActuatorSync<P> {
        &self.actuator
    }

    /// Checks the gate once and runs a full cycle if it is open.
    pub fn poll<S>(&mut self, store: &mut S, now_ms: u64) -> Option<CycleReport>
    where
        S: RealtimeStore,
    {
        if !store.is_ready()
            || !self.connection.firebase_authed
            || !self.state.is_due(now_ms, self.interval_ms)
        {
            return None;
        }

        Some(self.run_cycle(store, now_ms))
    }

    /// Polls forever, sleeping between gate checks.
    pub fn run<S, T, D>(&mut self, store: &mut S, uptime: &T, delay: &mut D) -> !
    where
        S: RealtimeStore,
        T: TimeProvider,
        D: DelayNs,
    {
        loop {
            if let Some(report) = self.poll(store, uptime.uptime_ms()) {
                debug!(
                    "Cycle at {} ms: {} written, {} failed",
                    report.started_at_ms,
                    report.publish.written(),
                    report.publish.failed()
                );
            }
            delay.delay_ms(self.poll_interval_ms);
        }
    }

    fn run_cycle<S>(&mut self, store: &mut S, now_ms: u64) -> CycleReport
    where
        S: RealtimeStore,
    {
        self.state.last_cycle_start = Some(now_ms);

        let sample = self.reader.read();
        let readings = self.reader.readings(&sample);
        let timestamp = self.stamper.now_timestamp();

        let publish = publish_readings(store, &timestamp, &readings);
        let actuator = self.actuator.sync(store);

        CycleReport {
            started_at_ms: now_ms,
            sample,
            readings,
            publish,
            actuator,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAnalog, MockClock, MockHygrometer, MockPin, MockStore};

    type TestScheduler = CycleScheduler<MockAnalog, MockHygrometer, MockClock, MockPin>;

    fn scheduler(connection: ConnectionState) -> TestScheduler {
        CycleScheduler::new(
            SensorReader::new(
                MockAnalog { value: 2048 },
                MockHygrometer::new(Ok(25.0), Ok(60.0)),
            ),
            TimeStamper::new(MockClock::at(1_704_090_600), 19_800, 0),
            ActuatorSync::new(MockPin::default()),
            connection,
        )
    }

    fn authed() -> ConnectionState {
        ConnectionState {
            wifi_connected: true,
            firebase_authed: true,
        }
    }

    #[test]
    fn test_first_poll_runs_immediately() {
        let mut store = MockStore::ready();
        let mut scheduler = scheduler(authed());

        let report = scheduler.poll(&mut store, 0).unwrap();

        assert_eq!(report.started_at_ms, 0);
        assert_eq!(report.publish.timestamp.as_str(), "2024-01-01_12-00-00");
        assert_eq!(scheduler.state().last_cycle_start, Some(0));
    }

    #[test]
    fn test_cycle_spacing() {
        let mut store = MockStore::ready();
        let mut scheduler = scheduler(authed());

        let start = 12_345;
        assert!(scheduler.poll(&mut store, start).is_some());

        for now in [start + 1, start + 2500, start + 4999] {
            assert!(
                scheduler.poll(&mut store, now).is_none(),
                "cycle ran early at {}",
                now
            );
        }

        assert!(scheduler.poll(&mut store, start + 5000).is_some());
        assert_eq!(scheduler.state().last_cycle_start, Some(start + 5000));
        assert_eq!(store.writes.len(), 6);
    }

    #[test]
    fn test_gate_requires_authentication_and_ready_store() {
        let mut store = MockStore::ready();
        let mut unauthed = scheduler(ConnectionState {
            wifi_connected: true,
            firebase_authed: false,
        });
        assert!(unauthed.poll(&mut store, 0).is_none());

        let mut not_ready = MockStore::default();
        let mut scheduler = scheduler(authed());
        assert!(scheduler.poll(&mut not_ready, 0).is_none());
        assert_eq!(scheduler.state().last_cycle_start, None);
        assert!(not_ready.writes.is_empty());
    }

    #[test]
    fn test_cycle_order() {
        let mut store = MockStore::ready();
        store.led = Ok(true);
        let mut scheduler = scheduler(authed());

        let report = scheduler.poll(&mut store, 0).unwrap();

        assert_eq!(report.actuator, ActuatorOutcome::Applied(true));
        assert_eq!(scheduler.actuator().pin().high, Some(true));
        assert_eq!(
            store.log,
            [
                "set sensor/ldr/2024-01-01_12-00-00/value",
                "set sensor/temp/2024-01-01_12-00-00/value",
                "set sensor/humi/2024-01-01_12-00-00/value",
                "get led/value",
            ]
        );
    }

    #[test]
    fn test_clock_going_backwards_is_not_due() {
        let state = SchedulerState {
            last_cycle_start: Some(10_000),
        };

        assert!(!state.is_due(9_000, CYCLE_INTERVAL_MS));
        assert!(state.is_due(15_000, CYCLE_INTERVAL_MS));
    }
}
