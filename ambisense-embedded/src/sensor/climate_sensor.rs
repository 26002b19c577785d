use log::warn;

use super::Hygrometer;

/// Temperature and humidity from a DHT-style sensor. Failed or NaN reads
/// come back as `None` and are never retried.
pub struct ClimateSensor<H>
where
    H: Hygrometer,
{
    device: H,
}

impl<H> ClimateSensor<H>
where
    H: Hygrometer,
{
    pub fn new(device: H) -> Self {
        Self { device }
    }

    pub fn read_humidity(&mut self) -> Option<f32> {
        let value = self.device.read_humidity();
        Self::accept("humidity", value)
    }

    pub fn read_temperature(&mut self) -> Option<f32> {
        let value = self.device.read_temperature();
        Self::accept("temperature", value)
    }

    fn accept(quantity: &str, value: Result<f32, H::Error>) -> Option<f32> {
        match value {
            Ok(v) if v.is_nan() => {
                warn!("DHT11 returned NaN {}", quantity);
                None
            }
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Failed to read {} from DHT11: {:?}", quantity, e);
                None
            }
        }
    }
}
