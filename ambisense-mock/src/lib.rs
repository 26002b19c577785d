use std::error::Error;
use std::time::Duration;

use ambisense_api::firebase::{FirebaseClient, FirebaseConfig, log_token_status};
use ambisense_embedded::{
    ActuatorSync, ConnectionState, CycleScheduler, SensorReader, StdDelay, SystemClock,
    SystemTimeProvider, TimeStamper, authenticate, connect_network, wait_for_time_sync,
};

use crate::settings::Settings;
use crate::simulate::{DayClock, LoggingLed, SimulatedDht, SimulatedLdr, SimulatedLink};
use crate::transport::ReqwestTransport;

pub mod settings;
pub mod simulate;
pub mod transport;

/// Runs the device loop on the host against a real database with simulated peripherals.
pub fn run(settings: &Settings) -> Result<(), Box<dyn Error>> {
    let device = &settings.device;
    let simulation = &settings.simulation;
    let mut delay = StdDelay;

    let mut link = SimulatedLink::new(simulation.wifi_join_polls);
    connect_network(
        &mut link,
        "ambisense-sim",
        "",
        device.network_retry,
        &mut delay,
    )?;

    tracing::info!("Using wall clock time (NTP server {} on device)", device.ntp_server);
    wait_for_time_sync(&SystemClock, device.time_sync_retry, &mut delay)?;

    let uptime = SystemTimeProvider::new();
    let transport = ReqwestTransport::new(Duration::from_millis(settings.firebase.timeout_ms))?;
    let mut store = FirebaseClient::new(
        FirebaseConfig::new(
            settings.firebase.api_key.as_str(),
            settings.firebase.database_url.as_str(),
        ),
        transport,
        &uptime,
    )
    .with_token_callback(log_token_status);
    tracing::info!("Firebase database {}", store.database_url());

    let connection = ConnectionState {
        wifi_connected: true,
        firebase_authed: authenticate(&mut store).is_ok(),
    };

    let day = DayClock::new(simulation.day_length_secs);
    let reader = SensorReader::with_calibration(
        SimulatedLdr::new(day, device.light_calibration, simulation.light_noise),
        SimulatedDht::new(day, simulation),
        device.light_calibration,
    );
    let stamper = TimeStamper::new(
        SystemClock,
        device.gmt_offset_secs,
        device.daylight_offset_secs,
    );
    let actuator = ActuatorSync::new(LoggingLed::new(device.led_pin));

    let mut scheduler = CycleScheduler::new(reader, stamper, actuator, connection)
        .with_interval(device.cycle_interval_ms)
        .with_poll_interval(device.poll_interval_ms);

    scheduler.run(&mut store, &uptime, &mut delay)
}
