use alloc::string::String;

use ambisense_api::{DAYLIGHT_OFFSET_SECONDS, LOCAL_UTC_OFFSET_SECONDS};
use serde::{Deserialize, Serialize};

use crate::scheduler::{CYCLE_INTERVAL_MS, IDLE_POLL_INTERVAL_MS};
use crate::sensor::LightSensorCalibration;
use crate::startup::{NETWORK_POLL_INTERVAL_MS, RetryPolicy, TIME_SYNC_POLL_INTERVAL_MS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// ADC1 channel wired to the LDR divider
    pub ldr_pin: u8,
    pub led_pin: u8,
    /// DHT11 data line
    pub dht_pin: u8,
    pub cycle_interval_ms: u64,
    /// Sleep between scheduler gate checks
    pub poll_interval_ms: u32,
    pub ntp_server: String,
    pub gmt_offset_secs: i32,
    pub daylight_offset_secs: i32,
    pub network_retry: RetryPolicy,
    pub time_sync_retry: RetryPolicy,
    pub light_calibration: LightSensorCalibration,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            ldr_pin: 34,
            led_pin: 2,
            dht_pin: 21,
            cycle_interval_ms: CYCLE_INTERVAL_MS,
            poll_interval_ms: IDLE_POLL_INTERVAL_MS,
            ntp_server: String::from("pool.ntp.org"),
            gmt_offset_secs: LOCAL_UTC_OFFSET_SECONDS,
            daylight_offset_secs: DAYLIGHT_OFFSET_SECONDS,
            network_retry: RetryPolicy::forever(NETWORK_POLL_INTERVAL_MS),
            time_sync_retry: RetryPolicy::forever(TIME_SYNC_POLL_INTERVAL_MS),
            light_calibration: LightSensorCalibration::default(),
        }
    }
}
