mod error;
mod hardware;
mod http;
mod wifi;

use std::time::Duration;

use ambisense_api::firebase::{FirebaseClient, FirebaseConfig, log_token_status};
use ambisense_api::TimeProvider;
use ambisense_embedded::{
    authenticate, connect_network, wait_for_time_sync, ActuatorSync, ConnectionState,
    CycleScheduler, DeviceConfig, HoldLastSample, SensorReader, SystemClock, SystemTimeProvider,
    TimeStamper,
};
use embedded_hal::delay::DelayNs;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::adc::oneshot::AdcDriver;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::gpio::{IOPin, PinDriver};
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::{EspSntp, SntpConf};
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::info;

use crate::error::Result;
use crate::hardware::{Dht11, Ldr};
use crate::http::EspTransport;
use crate::wifi::WifiManager;

const WIFI_SSID: &str = env!("WIFI_SSID");
const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");
const FIREBASE_API_KEY: &str = env!("FIREBASE_API_KEY");
const FIREBASE_DATABASE_URL: &str = env!("FIREBASE_DATABASE_URL");

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let config = DeviceConfig::default();
    let mut delay = FreeRtos;

    let peripherals = Peripherals::take()?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let ldr = HoldLastSample::new(Ldr::new(
        AdcDriver::new(peripherals.adc1)?,
        peripherals.pins.gpio34,
    )?)?;
    let led = PinDriver::output(peripherals.pins.gpio2)?;

    let mut wifi = WifiManager::new(BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sys_loop.clone(), Some(nvs_partition))?,
        sys_loop,
    )?);
    connect_network(
        &mut wifi,
        WIFI_SSID,
        WIFI_PASSWORD,
        config.network_retry,
        &mut delay,
    )?;

    let dht = Dht11::new(peripherals.pins.gpio21.downgrade())?;
    info!(
        "LDR on GPIO{}, DHT11 on GPIO{}, LED on GPIO{}",
        config.ldr_pin, config.dht_pin, config.led_pin
    );

    let mut sntp_conf = SntpConf::default();
    sntp_conf.servers[0] = config.ntp_server.as_str();
    let _sntp = EspSntp::new(&sntp_conf)?;
    wait_for_time_sync(&SystemClock, config.time_sync_retry, &mut delay)?;

    let uptime = SystemTimeProvider::new();
    let mut store = FirebaseClient::new(
        FirebaseConfig::new(FIREBASE_API_KEY, FIREBASE_DATABASE_URL),
        EspTransport::new(HTTP_TIMEOUT)?,
        &uptime,
    )
    .with_token_callback(log_token_status);

    let connection = ConnectionState {
        wifi_connected: true,
        firebase_authed: authenticate(&mut store).is_ok(),
    };

    let mut scheduler = CycleScheduler::new(
        SensorReader::with_calibration(ldr, dht, config.light_calibration),
        TimeStamper::new(
            SystemClock,
            config.gmt_offset_secs,
            config.daylight_offset_secs,
        ),
        ActuatorSync::new(led),
        connection,
    )
    .with_interval(config.cycle_interval_ms);

    loop {
        wifi.ensure_connected();
        scheduler.poll(&mut store, uptime.uptime_ms());
        delay.delay_ms(config.poll_interval_ms);
    }
}
