use core::fmt;

use alloc::format;
use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// Root of the telemetry subtree in the realtime database.
pub const SENSOR_ROOT: &str = "sensor";

/// Leaf that holds the remotely controlled LED state.
pub const ACTUATOR_PATH: &str = "led/value";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Photoresistor, published as estimated lux
    Ldr,
    /// DHT11 temperature in Celsius
    Temp,
    /// DHT11 relative humidity in percent
    Humi,
}

impl SensorKind {
    /// Publication order within one cycle.
    pub const ALL: [SensorKind; 3] = [SensorKind::Ldr, SensorKind::Temp, SensorKind::Humi];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Ldr => "ldr",
            SensorKind::Temp => "temp",
            SensorKind::Humi => "humi",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SensorKind::Ldr => "LUX",
            SensorKind::Temp => "Temperature",
            SensorKind::Humi => "Humidity",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slash separated key into the realtime database tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// `sensor/<kind>/<timestamp>/value`
    pub fn reading(kind: SensorKind, timestamp: &Timestamp) -> Self {
        Self(format!(
            "{}/{}/{}/value",
            SENSOR_ROOT,
            kind.as_str(),
            timestamp.as_str()
        ))
    }

    /// `led/value`
    pub fn actuator() -> Self {
        Self(String::from(ACTUATOR_PATH))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One cycle's worth of raw sensor data. `None` marks a failed read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// 12-bit ADC sample of the LDR divider (0-4095)
    pub analog_light: u16,
    /// Temperature in Celsius
    pub temperature_c: Option<f32>,
    /// Relative humidity in percent
    pub relative_humidity: Option<f32>,
}

/// Values ready for publication, derived from a [`RawSample`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Readings {
    pub lux: f32,
    pub temperature_c: Option<f32>,
    pub relative_humidity: Option<f32>,
}

impl Readings {
    pub fn new(lux: f32, sample: &RawSample) -> Self {
        Self {
            lux,
            temperature_c: sample.temperature_c,
            relative_humidity: sample.relative_humidity,
        }
    }

    pub fn value(&self, kind: SensorKind) -> Option<f32> {
        match kind {
            SensorKind::Ldr => Some(self.lux),
            SensorKind::Temp => self.temperature_c,
            SensorKind::Humi => self.relative_humidity,
        }
    }

    /// Fields in publication order: lux, temperature, humidity.
    pub fn fields(&self) -> [(SensorKind, Option<f32>); 3] {
        SensorKind::ALL.map(|kind| (kind, self.value(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_paths_share_timestamp() {
        let timestamp = Timestamp::parse("2024-01-01_12-00-00").unwrap();

        let paths: alloc::vec::Vec<RemotePath> = SensorKind::ALL
            .iter()
            .map(|kind| RemotePath::reading(*kind, &timestamp))
            .collect();

        assert_eq!(paths[0].as_str(), "sensor/ldr/2024-01-01_12-00-00/value");
        assert_eq!(paths[1].as_str(), "sensor/temp/2024-01-01_12-00-00/value");
        assert_eq!(paths[2].as_str(), "sensor/humi/2024-01-01_12-00-00/value");
    }

    #[test]
    fn test_actuator_path() {
        assert_eq!(RemotePath::actuator().as_str(), "led/value");
    }

    #[test]
    fn test_readings_field_order() {
        let sample = RawSample {
            analog_light: 2048,
            temperature_c: Some(27.5),
            relative_humidity: None,
        };
        let readings = Readings::new(120.0, &sample);

        let fields = readings.fields();
        assert_eq!(fields[0], (SensorKind::Ldr, Some(120.0)));
        assert_eq!(fields[1], (SensorKind::Temp, Some(27.5)));
        assert_eq!(fields[2], (SensorKind::Humi, None));
    }

    #[test]
    fn test_sensor_kind_serde() {
        let json = serde_json::to_string(&SensorKind::Humi).unwrap();
        assert_eq!(json, "\"humi\"");
    }
}
