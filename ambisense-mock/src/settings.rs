use std::error::Error;
use std::{env, fs};

use ambisense_embedded::DeviceConfig;
use serde::{Deserialize, Serialize};

/// Path of a settings file that replaces the compiled-in defaults.
pub const SETTINGS_ENV: &str = "AMBISENSE_SETTINGS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Firebase {
    pub api_key: String,
    pub database_url: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulation {
    pub day_length_secs: u64,
    /// Relative standard deviation applied to the simulated lux
    pub light_noise: f64,
    /// Standard deviation of the temperature in degrees
    pub temperature_noise: f64,
    /// Probability that a DHT read fails
    pub dht_failure_rate: f64,
    pub wifi_join_polls: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub logger: Logger,
    pub firebase: Firebase,
    #[serde(default)]
    pub device: DeviceConfig,
    pub simulation: Simulation,
}

impl Settings {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        let mut settings: Settings = match env::var(SETTINGS_ENV) {
            Ok(path) => Self::parse(&fs::read_to_string(path)?)?,
            Err(_) => Self::parse(include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/../",
                "configs/default.toml"
            )))?,
        };

        if let Ok(api_key) = env::var("FIREBASE_API_KEY") {
            settings.firebase.api_key = api_key;
        }
        if let Ok(database_url) = env::var("FIREBASE_DATABASE_URL") {
            settings.firebase.database_url = database_url;
        }

        if settings.firebase.api_key.is_empty() {
            return Err("firebase.api_key is empty, set FIREBASE_API_KEY".into());
        }

        Ok(settings)
    }

    pub fn parse(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use ambisense_embedded::RetryPolicy;

    use super::*;

    const DEFAULT: &str = include_str!(concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../",
        "configs/default.toml"
    ));

    #[test]
    fn test_default_settings_parse() {
        let settings = Settings::parse(DEFAULT).unwrap();

        assert_eq!(settings.logger.level, "info");
        assert_eq!(settings.device.cycle_interval_ms, 5000);
        assert_eq!(settings.device.gmt_offset_secs, 19_800);
        assert_eq!(settings.device.network_retry, RetryPolicy::forever(300));
        assert!(matches!(
            settings.device.time_sync_retry,
            RetryPolicy::Bounded { max_attempts: 20, .. }
        ));
        assert_eq!(settings.device.ldr_pin, 34);
    }

    #[test]
    fn test_device_section_is_optional() {
        let settings = Settings::parse(
            r#"
            [logger]
            level = "debug"

            [firebase]
            api_key = "key"
            database_url = "demo.firebaseio.com"
            timeout_ms = 5000

            [simulation]
            day_length_secs = 60
            light_noise = 0.0
            temperature_noise = 0.0
            dht_failure_rate = 0.0
            wifi_join_polls = 0
            "#,
        )
        .unwrap();

        assert_eq!(settings.device, DeviceConfig::default());
    }
}
